//! Shared fixtures for unit tests.

use crate::backend::AuthBackend;
use crate::error::{ApiError, AuthError, AuthResult};
use crate::types::{AuthErrorCode, AuthResponse, Role, SignupRequest, TokenPair, User};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn sample_user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: "Ada Lovelace".to_string(),
        avatar: None,
        github_username: Some("ada".to_string()),
        github_url: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        last_login: None,
        email_verified: true,
        roles: vec![Role::User],
    }
}

pub(crate) fn user_json(id: &str) -> serde_json::Value {
    serde_json::to_value(sample_user(id)).unwrap()
}

/// Scriptable in-process backend that counts its calls.
#[derive(Default)]
pub(crate) struct MockBackend {
    pub refresh_calls: AtomicUsize,
    pub exchange_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub signup_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    refresh_pair: Option<TokenPair>,
    refresh_delay: Duration,
    exchange_response: Option<serde_json::Value>,
    login_response: Option<serde_json::Value>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh(mut self, access: &str, refresh: &str) -> Self {
        self.refresh_pair = Some(TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        });
        self
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn with_exchange(mut self, response: serde_json::Value) -> Self {
        self.exchange_response = Some(response);
        self
    }

    /// Response for both login and signup.
    pub fn with_login(mut self, response: serde_json::Value) -> Self {
        self.login_response = Some(response);
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    fn scripted_login(&self) -> AuthResult<AuthResponse> {
        match &self.login_response {
            Some(body) => Ok(serde_json::from_value(body.clone())?),
            None => Err(ApiError::new(
                401,
                AuthErrorCode::InvalidCredentials,
                "Invalid email or password",
            )
            .into()),
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, _email: &str, _password: &str) -> AuthResult<AuthResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.scripted_login()
    }

    async fn signup(&self, _request: &SignupRequest) -> AuthResult<AuthResponse> {
        self.signup_calls.fetch_add(1, Ordering::SeqCst);
        self.scripted_login()
    }

    async fn logout(&self, _access_token: &str) -> AuthResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn refresh_tokens(&self, _refresh_token: &str) -> AuthResult<TokenPair> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        self.refresh_pair.clone().ok_or_else(|| {
            ApiError::new(401, AuthErrorCode::InvalidRefreshToken, "Refresh token revoked").into()
        })
    }

    async fn get_profile(&self, _access_token: &str) -> AuthResult<User> {
        Ok(sample_user("u1"))
    }

    async fn exchange_oauth_code(&self, _code: &str, _state: &str) -> AuthResult<AuthResponse> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        match &self.exchange_response {
            Some(body) => Ok(serde_json::from_value(body.clone())?),
            None => Err(AuthError::OAuthExchange("OAuth callback failed".to_string())),
        }
    }
}
