//! Fail-soft token slots over durable storage.

use crate::{KeyValueStore, StorageKeys};
use std::sync::Arc;
use tracing::error;

/// Which of the two token slots to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn storage_key(self) -> &'static str {
        match self {
            TokenKind::Access => StorageKeys::ACCESS_TOKEN,
            TokenKind::Refresh => StorageKeys::REFRESH_TOKEN,
        }
    }
}

/// Access/refresh token storage.
///
/// Storage failures are logged and swallowed: a failed write is dropped, a
/// failed read reports the token as absent.
#[derive(Clone)]
pub struct TokenStorage {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, kind: TokenKind, value: &str) {
        if let Err(e) = self.store.set(kind.storage_key(), value) {
            error!(slot = ?kind, error = %e, "Failed to save token");
        }
    }

    pub fn get(&self, kind: TokenKind) -> Option<String> {
        match self.store.get(kind.storage_key()) {
            Ok(value) => value,
            Err(e) => {
                error!(slot = ?kind, error = %e, "Failed to read token");
                None
            }
        }
    }

    pub fn remove(&self, kind: TokenKind) {
        if let Err(e) = self.store.delete(kind.storage_key()) {
            error!(slot = ?kind, error = %e, "Failed to clear token");
        }
    }

    /// Store both tokens of a pair.
    pub fn save_pair(&self, access_token: &str, refresh_token: &str) {
        self.save(TokenKind::Access, access_token);
        self.save(TokenKind::Refresh, refresh_token);
    }

    /// Remove both slots.
    pub fn clear(&self) {
        self.remove(TokenKind::Access);
        self.remove(TokenKind::Refresh);
    }

    /// True only when both slots hold a value.
    pub fn has_tokens(&self) -> bool {
        self.get(TokenKind::Access).is_some() && self.get(TokenKind::Refresh).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStorage, StorageError, StorageResult};

    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Backend("storage disabled".to_string()))
        }

        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Backend("storage disabled".to_string()))
        }

        fn delete(&self, _key: &str) -> StorageResult<bool> {
            Err(StorageError::Backend("storage disabled".to_string()))
        }
    }

    #[test]
    fn test_save_get_clear() {
        let tokens = TokenStorage::new(Arc::new(MemoryStorage::new()));
        tokens.save(TokenKind::Access, "a1");
        tokens.save(TokenKind::Refresh, "r1");

        assert_eq!(tokens.get(TokenKind::Access).as_deref(), Some("a1"));
        assert_eq!(tokens.get(TokenKind::Refresh).as_deref(), Some("r1"));

        tokens.clear();
        assert_eq!(tokens.get(TokenKind::Access), None);
        assert_eq!(tokens.get(TokenKind::Refresh), None);
    }

    #[test]
    fn test_has_tokens_requires_both() {
        let tokens = TokenStorage::new(Arc::new(MemoryStorage::new()));
        assert!(!tokens.has_tokens());

        tokens.save(TokenKind::Access, "a1");
        assert!(!tokens.has_tokens());

        tokens.save(TokenKind::Refresh, "r1");
        assert!(tokens.has_tokens());
    }

    #[test]
    fn test_uses_fixed_slot_keys() {
        let store = Arc::new(MemoryStorage::new());
        let tokens = TokenStorage::new(store.clone());
        tokens.save_pair("a1", "r1");

        assert_eq!(store.get("auth_access_token").unwrap().as_deref(), Some("a1"));
        assert_eq!(store.get("auth_refresh_token").unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn test_failures_are_swallowed() {
        let tokens = TokenStorage::new(Arc::new(BrokenStorage));
        tokens.save(TokenKind::Access, "a1");
        tokens.clear();

        assert_eq!(tokens.get(TokenKind::Access), None);
        assert!(!tokens.has_tokens());
    }
}
