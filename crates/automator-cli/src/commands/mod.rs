//! CLI command implementations.

mod auth;
mod deployments;
mod mode;
mod nodes;
mod oauth;

pub use auth::{login, logout, profile, refresh, signup, status};
pub use deployments::{deployments_list, deployments_remove, deployments_show};
pub use mode::{mode_reset, mode_set, mode_show};
pub use nodes::{nodes_list, nodes_remove, nodes_show};
pub use oauth::{oauth_callback, oauth_start};

use anyhow::Result;
use auth_session::{
    AppMode, AuthApiClient, AuthenticatedApiClient, ModeStore, SessionContext,
    TokenRefreshCoordinator,
};
use automator_config::{Config, Paths};
use session_storage::{FileStorage, KeyValueStore};
use std::sync::Arc;

/// Everything a command needs, wired from the on-disk layout.
pub struct Client {
    pub config: Config,
    pub durable: Arc<dyn KeyValueStore>,
    pub session: Arc<SessionContext>,
    pub backend: Arc<AuthApiClient>,
    pub api: AuthenticatedApiClient,
    pub refresher: TokenRefreshCoordinator,
    pub modes: ModeStore,
}

impl Client {
    pub fn new(paths: &Paths, config: Config) -> Result<Self> {
        paths.ensure_dirs()?;
        let durable: Arc<dyn KeyValueStore> = Arc::new(FileStorage::new(paths.storage_file()));
        // Each command is its own process, so the pending OAuth state needs a file.
        let transient: Arc<dyn KeyValueStore> =
            Arc::new(FileStorage::new(paths.transient_file()));

        let session = SessionContext::init(durable.clone(), transient);
        let backend = Arc::new(AuthApiClient::from_config(&config));
        let api = AuthenticatedApiClient::from_config(&config, session.clone());
        let refresher = TokenRefreshCoordinator::new(session.clone(), backend.clone());
        let modes = ModeStore::new(durable.clone());

        Ok(Self {
            config,
            durable,
            session,
            backend,
            api,
            refresher,
            modes,
        })
    }

    /// True when the stored mode is cloud and a user is signed in.
    pub fn is_cloud_session(&self) -> bool {
        self.modes.get() == Some(AppMode::Cloud) && self.session.store().is_authenticated()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.session.dispose();
    }
}
