//! Local/cloud mode selection and the dashboard access guard.

use crate::store::SessionState;
use serde::{Deserialize, Serialize};
use session_storage::{KeyValueStore, StorageKeys, StorageResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    /// Offline, no account.
    Local,
    /// Backend-backed, requires sign-in.
    Cloud,
}

impl AppMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Local => "local",
            AppMode::Cloud => "cloud",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, AppMode::Cloud)
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(AppMode::Local),
            "cloud" => Ok(AppMode::Cloud),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// The chosen mode, persisted under `automator67_mode`.
pub struct ModeStore {
    storage: Arc<dyn KeyValueStore>,
}

impl ModeStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Stored mode. Unreadable or unrecognized values read as unset.
    pub fn get(&self) -> Option<AppMode> {
        match self.storage.get(StorageKeys::MODE) {
            Ok(Some(raw)) => match raw.parse() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    warn!(error = %e, "Ignoring stored mode");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored mode");
                None
            }
        }
    }

    pub fn set(&self, mode: AppMode) -> StorageResult<()> {
        self.storage.set(StorageKeys::MODE, mode.as_str())?;
        info!(mode = %mode, "Mode selected");
        Ok(())
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::MODE)?;
        info!("Mode cleared");
        Ok(())
    }
}

/// Whether the dashboard for `required` may be shown.
///
/// The stored mode must match; cloud additionally needs a signed-in session.
pub fn can_access_dashboard(
    required: AppMode,
    stored: Option<AppMode>,
    session: &SessionState,
) -> bool {
    if stored != Some(required) {
        return false;
    }
    !required.requires_auth() || session.is_authenticated
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_storage::MemoryStorage;

    #[test]
    fn test_mode_store_roundtrip_and_garbage() {
        let storage = Arc::new(MemoryStorage::new());
        let modes = ModeStore::new(storage.clone());
        assert_eq!(modes.get(), None);

        modes.set(AppMode::Cloud).unwrap();
        assert_eq!(storage.get(StorageKeys::MODE).unwrap().as_deref(), Some("cloud"));
        assert_eq!(modes.get(), Some(AppMode::Cloud));

        storage.set(StorageKeys::MODE, "hybrid").unwrap();
        assert_eq!(modes.get(), None);

        modes.clear().unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_guard() {
        let anonymous = SessionState::default();
        let signed_in = SessionState {
            is_authenticated: true,
            ..SessionState::default()
        };

        assert!(can_access_dashboard(AppMode::Local, Some(AppMode::Local), &anonymous));
        assert!(!can_access_dashboard(AppMode::Local, None, &signed_in));
        assert!(!can_access_dashboard(AppMode::Local, Some(AppMode::Cloud), &signed_in));
        assert!(!can_access_dashboard(AppMode::Cloud, Some(AppMode::Cloud), &anonymous));
        assert!(can_access_dashboard(AppMode::Cloud, Some(AppMode::Cloud), &signed_in));
    }
}
