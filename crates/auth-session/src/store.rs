//! Session state store.
//!
//! Holds the current user, both tokens and the auth flags. Every mutation is
//! written through to durable storage (the persisted subset only) and then
//! reported to the optional state listener.

use crate::types::{AuthErrorCode, User};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use session_storage::{load_json, save_json, KeyValueStore, StorageKeys};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Full in-memory session.
///
/// `is_authenticated` always equals `user.is_some()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<AuthErrorCode>,
}

/// Subset of [`SessionState`] that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl From<&SessionState> for PersistedSession {
    fn from(state: &SessionState) -> Self {
        Self {
            user: state.user.clone(),
            access_token: state.access_token.clone(),
            refresh_token: state.refresh_token.clone(),
            is_authenticated: state.is_authenticated,
        }
    }
}

impl From<PersistedSession> for SessionState {
    fn from(persisted: PersistedSession) -> Self {
        // The stored flag is not trusted; it is derived from the user.
        let is_authenticated = persisted.user.is_some();
        Self {
            user: persisted.user,
            access_token: persisted.access_token,
            refresh_token: persisted.refresh_token,
            is_authenticated,
            is_loading: false,
            error: None,
        }
    }
}

/// Callback invoked with the new state after every change. Must not call
/// back into the store.
pub type SessionListener = Box<dyn Fn(&SessionState) + Send + Sync>;

pub struct SessionStore {
    state: RwLock<SessionState>,
    durable: Arc<dyn KeyValueStore>,
    listener: Mutex<Option<SessionListener>>,
}

impl SessionStore {
    /// Empty store writing through to `durable`.
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            durable,
            listener: Mutex::new(None),
        }
    }

    /// Store seeded from the persisted subset in `durable`.
    ///
    /// A missing or unreadable record yields an empty session.
    pub fn load(durable: Arc<dyn KeyValueStore>) -> Self {
        let state = match load_json::<PersistedSession>(durable.as_ref(), StorageKeys::SESSION) {
            Ok(Some(persisted)) => SessionState::from(persisted),
            Ok(None) => SessionState::default(),
            Err(e) => {
                warn!(error = %e, "Persisted session unreadable, starting signed out");
                SessionState::default()
            }
        };
        debug!(is_authenticated = state.is_authenticated, "Session store loaded");

        Self {
            state: RwLock::new(state),
            durable,
            listener: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }

    pub fn set_state_callback(&self, listener: SessionListener) {
        *self.listener.lock() = Some(listener);
    }

    pub fn clear_state_callback(&self) {
        *self.listener.lock() = None;
    }

    pub fn login(&self, user: User, access_token: String, refresh_token: Option<String>) {
        self.update(|state| {
            state.user = Some(user);
            state.access_token = Some(access_token);
            state.refresh_token = refresh_token;
            state.is_authenticated = true;
            state.is_loading = false;
            state.error = None;
        });
    }

    pub fn logout(&self) {
        self.update(|state| {
            *state = SessionState::default();
        });
    }

    pub fn set_user(&self, user: Option<User>) {
        self.update(|state| {
            state.is_authenticated = user.is_some();
            state.user = user;
        });
    }

    pub fn set_access_token(&self, token: Option<String>) {
        self.update(|state| state.access_token = token);
    }

    pub fn set_refresh_token(&self, token: Option<String>) {
        self.update(|state| state.refresh_token = token);
    }

    /// Replace both tokens in one change.
    pub fn set_tokens(&self, access_token: Option<String>, refresh_token: Option<String>) {
        self.update(|state| {
            state.access_token = access_token;
            state.refresh_token = refresh_token;
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.update(|state| state.is_loading = loading);
    }

    pub fn set_error(&self, error: Option<AuthErrorCode>) {
        self.update(|state| state.error = error);
    }

    /// Write the persisted subset to durable storage now.
    pub fn flush(&self) {
        let persisted = PersistedSession::from(&*self.state.read());
        self.persist(&persisted);
    }

    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut SessionState),
    {
        let (before, after) = {
            let mut state = self.state.write();
            let before = PersistedSession::from(&*state);
            mutate(&mut state);
            (before, state.clone())
        };

        let persisted = PersistedSession::from(&after);
        if persisted != before {
            self.persist(&persisted);
        }

        if let Some(listener) = self.listener.lock().as_ref() {
            listener(&after);
        }
    }

    fn persist(&self, persisted: &PersistedSession) {
        if let Err(e) = save_json(self.durable.as_ref(), StorageKeys::SESSION, persisted) {
            error!(error = %e, "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_user;
    use session_storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memory() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn test_login_sets_authenticated_and_persists() {
        let durable = memory();
        let store = SessionStore::new(durable.clone());

        store.login(sample_user("u1"), "a1".to_string(), Some("r1".to_string()));

        let state = store.snapshot();
        assert!(state.is_authenticated);
        assert_eq!(state.access_token.as_deref(), Some("a1"));

        let persisted: PersistedSession =
            load_json(durable.as_ref(), StorageKeys::SESSION).unwrap().unwrap();
        assert_eq!(persisted.user.map(|u| u.id).as_deref(), Some("u1"));
        assert!(persisted.is_authenticated);
    }

    #[test]
    fn test_transient_fields_are_not_persisted() {
        let durable = memory();
        let store = SessionStore::new(durable.clone());
        store.set_loading(true);
        store.set_error(Some(AuthErrorCode::NetworkError));

        let raw = durable.get(StorageKeys::SESSION).unwrap().unwrap_or_default();
        assert!(!raw.contains("isLoading"));
        assert!(!raw.contains("NETWORK_ERROR"));

        let reloaded = SessionStore::load(durable);
        let state = reloaded.snapshot();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_load_recomputes_authenticated_flag() {
        let durable = memory();
        save_json(
            durable.as_ref(),
            StorageKeys::SESSION,
            &PersistedSession {
                user: None,
                access_token: Some("stale".to_string()),
                refresh_token: None,
                is_authenticated: true,
            },
        )
        .unwrap();

        let store = SessionStore::load(durable);
        assert!(!store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("stale"));
    }

    #[test]
    fn test_corrupt_record_loads_empty() {
        let durable = memory();
        durable.set(StorageKeys::SESSION, "{ nope").unwrap();

        let store = SessionStore::load(durable);
        assert_eq!(store.snapshot(), SessionState::default());
    }

    #[test]
    fn test_set_user_tracks_authenticated() {
        let store = SessionStore::new(memory());

        store.set_user(Some(sample_user("u1")));
        assert!(store.is_authenticated());

        store.set_user(None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_logout_clears_everything() {
        let store = SessionStore::new(memory());
        store.login(sample_user("u1"), "a1".to_string(), Some("r1".to_string()));
        store.set_error(Some(AuthErrorCode::TokenExpired));

        store.logout();
        assert_eq!(store.snapshot(), SessionState::default());
    }

    #[test]
    fn test_listener_sees_every_change() {
        let store = SessionStore::new(memory());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        store.set_state_callback(Box::new(move |state| {
            assert_eq!(state.is_authenticated, state.user.is_some());
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        store.set_loading(true);
        store.login(sample_user("u1"), "a1".to_string(), None);
        store.logout();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        store.clear_state_callback();
        store.set_loading(false);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
