//! Storage key constants.

/// Storage keys used by the client
pub struct StorageKeys;

impl StorageKeys {
    /// Access token slot
    pub const ACCESS_TOKEN: &'static str = "auth_access_token";

    /// Refresh token slot
    pub const REFRESH_TOKEN: &'static str = "auth_refresh_token";

    /// Persisted session subset (JSON)
    pub const SESSION: &'static str = "auth-storage";

    /// Nodes store snapshot (JSON)
    pub const NODES: &'static str = "nodes-storage";

    /// Deployments store snapshot (JSON)
    pub const DEPLOYMENTS: &'static str = "deployments-storage";

    /// Selected application mode (`local` or `cloud`)
    pub const MODE: &'static str = "automator67_mode";

    /// Pending OAuth state. Lives in transient storage only.
    pub const OAUTH_STATE: &'static str = "oauth_state";
}
