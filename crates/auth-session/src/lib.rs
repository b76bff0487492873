//! Authentication session lifecycle for the Automator67 client.
//!
//! Pieces, leaf first:
//! - [`SessionStore`]: user, tokens and auth flags, persisted on every change
//! - [`SessionContext`]: owns the store plus token and transient storage
//! - [`TokenRefreshCoordinator`]: single-flight token refresh
//! - [`AuthenticatedApiClient`]: bearer-authenticated REST calls, logs out on 401/403
//! - [`OAuthCallbackProcessor`]: one-shot GitHub OAuth callback handling
//! - [`CredentialsAuth`]: email/password login and signup

mod api_client;
mod auth_client;
mod backend;
mod context;
mod credentials;
mod error;
mod mode;
mod oauth;
mod refresh;
mod refresh_fsm;
mod store;
mod types;

pub use api_client::AuthenticatedApiClient;
pub use auth_client::AuthApiClient;
pub use backend::AuthBackend;
pub use context::SessionContext;
pub use credentials::{
    password_strength_issues, validate_credentials, validate_email, validate_name,
    CredentialsAuth, CredentialsForm, CredentialsMode,
};
pub use error::{ApiError, AuthError, AuthResult};
pub use mode::{can_access_dashboard, AppMode, ModeStore};
pub use oauth::{
    generate_state, is_callback_url, CallbackOutcome, CallbackStatus, GitHubOAuth,
    OAuthCallbackProcessor, OAuthStart, RedirectPlan, CALLBACK_PATH, ERROR_REDIRECT_DELAY,
    GITHUB_AUTHORIZE_URL, GITHUB_SCOPE, REDIRECT_TARGET, SUCCESS_REDIRECT_DELAY,
};
pub use refresh::TokenRefreshCoordinator;
pub use refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshMachineState, RefreshState};
pub use store::{PersistedSession, SessionListener, SessionState, SessionStore};
pub use types::{AuthErrorCode, AuthResponse, Role, SignupRequest, TokenPair, User};

#[cfg(test)]
pub(crate) mod test_support;
