//! Authenticated REST client for the backend resource API.
//!
//! Attaches the session's access token as a bearer header. A 401 or 403
//! ends the session (store and token slots) and surfaces
//! [`AuthError::AuthenticationRequired`]. It never refreshes on its own;
//! callers that want refresh-and-retry wrap calls in
//! [`crate::TokenRefreshCoordinator::retry_with_refresh`].

use crate::context::SessionContext;
use crate::error::{ApiError, AuthError, AuthResult};
use crate::types::AuthErrorCode;
use automator_config::Config;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<AuthErrorCode>,
}

#[derive(Clone)]
pub struct AuthenticatedApiClient {
    http: Client,
    base_url: String,
    context: Arc<SessionContext>,
}

impl AuthenticatedApiClient {
    /// Client for resources under `base_url` (e.g. `http://localhost:3000/api/v1`).
    pub fn new(base_url: &str, context: Arc<SessionContext>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            context,
        }
    }

    /// Client for the versioned resource API under the configured API root.
    pub fn from_config(config: &Config, context: Arc<SessionContext>) -> Self {
        let base = format!("{}/v1", config.api_base_url.trim_end_matches('/'));
        Self::new(&base, context)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        self.request::<(), T>(Method::DELETE, path, None).await
    }

    /// Send one request with JSON content type and bearer auth.
    pub async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "API request");

        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.context.store().access_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), url = %url, "Request rejected, ending session");
            self.context.logout();
            return Err(AuthError::AuthenticationRequired);
        }

        let text = response.text().await?;

        if !status.is_success() {
            let parsed: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let err = ApiError::new(
                status.as_u16(),
                parsed.error_code.unwrap_or(AuthErrorCode::UnknownError),
                parsed
                    .error
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            );
            warn!(status = err.status, url = %url, "API request failed");
            return Err(err.into());
        }

        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }
}
