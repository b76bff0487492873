//! Injectable session context.
//!
//! One `SessionContext` per running client, shared as `Arc<SessionContext>`.
//! It owns the [`SessionStore`], the durable token slots and the transient
//! (process-lifetime) storage used for the pending OAuth state.

use crate::store::SessionStore;
use crate::types::User;
use session_storage::{KeyValueStore, MemoryStorage, TokenKind, TokenStorage};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SessionContext {
    store: SessionStore,
    tokens: TokenStorage,
    durable: Arc<dyn KeyValueStore>,
    transient: Arc<dyn KeyValueStore>,
}

impl SessionContext {
    /// Build the context from storage.
    ///
    /// The persisted session is loaded first. When both token slots hold a
    /// token the pair is mirrored into it; the slots win because the refresh
    /// path writes them before the session record. A lone slot is ignored.
    pub fn init(durable: Arc<dyn KeyValueStore>, transient: Arc<dyn KeyValueStore>) -> Arc<Self> {
        let store = SessionStore::load(durable.clone());
        let tokens = TokenStorage::new(durable.clone());

        if let (Some(access), Some(refresh)) =
            (tokens.get(TokenKind::Access), tokens.get(TokenKind::Refresh))
        {
            store.set_tokens(Some(access), Some(refresh));
            debug!("Mirrored stored tokens into session");
        }

        info!(
            is_authenticated = store.is_authenticated(),
            "Session context initialized"
        );

        Arc::new(Self {
            store,
            tokens,
            durable,
            transient,
        })
    }

    /// Context backed entirely by memory.
    pub fn in_memory() -> Arc<Self> {
        Self::init(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn tokens(&self) -> &TokenStorage {
        &self.tokens
    }

    pub fn durable(&self) -> &Arc<dyn KeyValueStore> {
        &self.durable
    }

    pub fn transient(&self) -> &Arc<dyn KeyValueStore> {
        &self.transient
    }

    /// Commit a successful sign-in to the session and the token slots.
    ///
    /// With no refresh token the refresh slot is cleared so a stale token from
    /// an earlier session cannot be paired with the new access token.
    pub fn commit_login(&self, user: User, access_token: String, refresh_token: Option<String>) {
        self.tokens.save(TokenKind::Access, &access_token);
        match refresh_token.as_deref() {
            Some(refresh) => self.tokens.save(TokenKind::Refresh, refresh),
            None => self.tokens.remove(TokenKind::Refresh),
        }

        info!(user_id = %user.id, has_refresh = refresh_token.is_some(), "Signed in");
        self.store.login(user, access_token, refresh_token);
    }

    /// Clear the session and both token slots.
    pub fn logout(&self) {
        self.tokens.clear();
        self.store.logout();
        info!("Logged out");
    }

    /// Flush the persisted session and detach the state listener.
    pub fn dispose(&self) {
        self.store.flush();
        self.store.clear_state_callback();
        debug!("Session context disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PersistedSession;
    use crate::test_support::sample_user;
    use session_storage::{load_json, FileStorage, StorageKeys};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn test_init_mirrors_token_slots() {
        let durable = Arc::new(MemoryStorage::new());
        durable.set(StorageKeys::ACCESS_TOKEN, "a-slot").unwrap();
        durable.set(StorageKeys::REFRESH_TOKEN, "r-slot").unwrap();

        let context = SessionContext::init(durable, Arc::new(MemoryStorage::new()));
        let state = context.store().snapshot();
        assert_eq!(state.access_token.as_deref(), Some("a-slot"));
        assert_eq!(state.refresh_token.as_deref(), Some("r-slot"));
        assert!(!state.is_authenticated);
    }

    #[test]
    fn test_init_ignores_a_lone_token_slot() {
        let durable = Arc::new(MemoryStorage::new());
        durable.set(StorageKeys::ACCESS_TOKEN, "a-slot").unwrap();

        let context = SessionContext::init(durable, Arc::new(MemoryStorage::new()));
        let state = context.store().snapshot();
        assert_eq!(state.access_token, None);
        assert_eq!(state.refresh_token, None);
    }

    #[test]
    fn test_session_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let first = SessionContext::init(
            Arc::new(FileStorage::new(&path)),
            Arc::new(MemoryStorage::new()),
        );
        first.commit_login(sample_user("u1"), "a1".to_string(), Some("r1".to_string()));
        first.dispose();

        let second = SessionContext::init(
            Arc::new(FileStorage::new(&path)),
            Arc::new(MemoryStorage::new()),
        );
        let state = second.store().snapshot();
        assert!(state.is_authenticated);
        assert_eq!(state.user.map(|u| u.id).as_deref(), Some("u1"));
        assert_eq!(state.refresh_token.as_deref(), Some("r1"));
        assert!(second.tokens().has_tokens());
    }

    #[test]
    fn test_commit_without_refresh_clears_stale_slot() {
        let context = SessionContext::in_memory();
        context.tokens().save(TokenKind::Refresh, "old-refresh");

        context.commit_login(sample_user("u1"), "a1".to_string(), None);

        assert_eq!(context.tokens().get(TokenKind::Access).as_deref(), Some("a1"));
        assert_eq!(context.tokens().get(TokenKind::Refresh), None);
        assert!(context.store().is_authenticated());
        assert!(context.store().refresh_token().is_none());
    }

    #[test]
    fn test_logout_clears_store_and_slots() {
        let context = SessionContext::in_memory();
        context.commit_login(sample_user("u1"), "a1".to_string(), Some("r1".to_string()));

        context.logout();

        assert!(!context.store().is_authenticated());
        assert!(!context.tokens().has_tokens());
        let persisted: PersistedSession =
            load_json(context.durable().as_ref(), StorageKeys::SESSION)
                .unwrap()
                .unwrap();
        assert!(persisted.user.is_none());
    }

    #[test]
    fn test_dispose_detaches_listener() {
        let context = SessionContext::in_memory();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        context.store().set_state_callback(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        context.store().set_loading(true);
        context.dispose();
        context.store().set_loading(false);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
