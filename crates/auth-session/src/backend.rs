//! Backend auth API seam.

use crate::error::AuthResult;
use crate::types::{AuthResponse, SignupRequest, TokenPair, User};
use async_trait::async_trait;

/// Calls the auth flows make against the backend.
///
/// [`crate::AuthApiClient`] is the HTTP implementation; tests substitute
/// in-process doubles.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> AuthResult<AuthResponse>;

    async fn signup(&self, request: &SignupRequest) -> AuthResult<AuthResponse>;

    /// Invalidate the session server-side.
    async fn logout(&self, access_token: &str) -> AuthResult<()>;

    /// Exchange a refresh token for a new pair.
    async fn refresh_tokens(&self, refresh_token: &str) -> AuthResult<TokenPair>;

    async fn get_profile(&self, access_token: &str) -> AuthResult<User>;

    /// Exchange a GitHub authorization code. Called once per callback.
    async fn exchange_oauth_code(&self, code: &str, state: &str) -> AuthResult<AuthResponse>;
}
