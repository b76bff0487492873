//! HTTP client for the backend auth endpoints.

use crate::backend::AuthBackend;
use crate::error::{ApiError, AuthError, AuthResult};
use crate::types::{AuthErrorCode, AuthResponse, SignupRequest, TokenPair, User};
use async_trait::async_trait;
use automator_config::Config;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Error body shape shared by the backend's endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<AuthErrorCode>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    user: Option<User>,
}

/// Auth API client rooted at the backend API base (e.g. `http://localhost:3000/api`).
#[derive(Clone)]
pub struct AuthApiClient {
    http: Client,
    base_url: String,
}

impl AuthApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send the request; transport failures become `NETWORK_ERROR`.
    async fn execute(&self, request: RequestBuilder) -> AuthResult<(StatusCode, String)> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Auth request could not be sent");
            ApiError::network(format!("Network error occurred: {}", e))
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Network error occurred: {}", e)))?;
        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> AuthResult<T> {
        if !status.is_success() {
            let parsed = ErrorBody::parse(body);
            let err = ApiError::new(
                status.as_u16(),
                parsed.error_code.unwrap_or(AuthErrorCode::UnknownError),
                parsed
                    .message
                    .or(parsed.error)
                    .unwrap_or_else(|| "An error occurred".to_string()),
            );
            warn!(status = err.status, code = %err.code, "Auth request rejected");
            return Err(err.into());
        }

        let body = if body.trim().is_empty() { "null" } else { body };
        serde_json::from_str(body)
            .map_err(|e| ApiError::network(format!("Invalid response body: {}", e)).into())
    }
}

#[async_trait]
impl AuthBackend for AuthApiClient {
    async fn login(&self, email: &str, password: &str) -> AuthResult<AuthResponse> {
        debug!(email = %email, "Attempting email/password login");
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let (status, body) = self.execute(request).await?;
        Self::decode(status, &body)
    }

    async fn signup(&self, signup: &SignupRequest) -> AuthResult<AuthResponse> {
        debug!(email = %signup.email, "Attempting signup");
        let request = self.http.post(self.url("/auth/signup")).json(signup);
        let (status, body) = self.execute(request).await?;
        Self::decode(status, &body)
    }

    async fn logout(&self, access_token: &str) -> AuthResult<()> {
        let request = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(access_token);
        let (status, body) = self.execute(request).await?;
        let _: serde_json::Value = Self::decode(status, &body)?;
        Ok(())
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let request = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }));
        let (status, body) = self.execute(request).await?;
        let response: AuthResponse = Self::decode(status, &body)?;

        let access_token = response
            .access_token()
            .ok_or_else(|| AuthError::InvalidResponse("Refresh response missing access token".to_string()))?
            .to_string();
        // A backend that does not rotate refresh tokens omits the field.
        let refresh_token = response
            .refresh_token()
            .unwrap_or(refresh_token)
            .to_string();

        info!("Token refresh accepted");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn get_profile(&self, access_token: &str) -> AuthResult<User> {
        let request = self
            .http
            .get(self.url("/auth/profile"))
            .bearer_auth(access_token);
        let (status, body) = self.execute(request).await?;
        let response: ProfileResponse = Self::decode(status, &body)?;
        response
            .user
            .ok_or_else(|| AuthError::InvalidResponse("Profile response missing user".to_string()))
    }

    async fn exchange_oauth_code(&self, code: &str, state: &str) -> AuthResult<AuthResponse> {
        debug!(url = %self.url("/auth/github/callback"), "Exchanging OAuth code");
        let request = self
            .http
            .post(self.url("/auth/github/callback"))
            .json(&serde_json::json!({ "code": code, "state": state }));
        let (status, body) = self.execute(request).await?;

        if !status.is_success() {
            let parsed = ErrorBody::parse(&body);
            let message = parsed
                .error
                .or(parsed.message)
                .unwrap_or_else(|| "OAuth callback failed".to_string());
            warn!(status = status.as_u16(), "OAuth code exchange rejected");
            return Err(AuthError::OAuthExchange(message));
        }

        Self::decode(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json() -> serde_json::Value {
        json!({
            "id": "u1",
            "email": "ada@example.com",
            "name": "Ada",
            "createdAt": "2024-05-01T10:00:00Z",
            "emailVerified": true,
            "roles": ["user"]
        })
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": "ada@example.com", "password": "hunter22" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "user": user_json(),
                "accessToken": "a1",
                "refreshToken": "r1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        let response = client.login("ada@example.com", "hunter22").await.unwrap();

        assert!(response.success);
        assert_eq!(response.access_token(), Some("a1"));
        assert_eq!(response.user.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_error_body_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "errorCode": "INVALID_CREDENTIALS",
                "message": "Invalid email or password"
            })))
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        let err = client.login("ada@example.com", "wrong").await.unwrap_err();

        match err {
            AuthError::Api(api) => {
                assert_eq!(api.status, 401);
                assert_eq!(api.code, AuthErrorCode::InvalidCredentials);
                assert_eq!(api.message, "Invalid email or password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_without_body_uses_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signup"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        let err = client
            .signup(&SignupRequest {
                email: "a@b.co".to_string(),
                password: "Secret123!".to_string(),
                name: None,
            })
            .await
            .unwrap_err();

        match err {
            AuthError::Api(api) => {
                assert_eq!(api.status, 500);
                assert_eq!(api.code, AuthErrorCode::UnknownError);
                assert_eq!(api.message, "An error occurred");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is not served in test environments.
        let client = AuthApiClient::new("http://127.0.0.1:9");
        let err = client.refresh_tokens("r1").await.unwrap_err();
        assert_eq!(err.error_code(), AuthErrorCode::NetworkError);
        assert_eq!(err.status(), Some(0));
    }

    #[tokio::test]
    async fn test_refresh_sends_refresh_token_and_keeps_it_when_not_rotated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({ "refreshToken": "r1" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "accessToken": "a2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        let pair = client.refresh_tokens("r1").await.unwrap();
        assert_eq!(pair.access_token, "a2");
        assert_eq!(pair.refresh_token, "r1");
    }

    #[tokio::test]
    async fn test_refresh_rejected_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "errorCode": "INVALID_REFRESH_TOKEN",
                "message": "Refresh token revoked"
            })))
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        let err = client.refresh_tokens("r1").await.unwrap_err();
        assert_eq!(err.error_code(), AuthErrorCode::InvalidRefreshToken);
    }

    #[tokio::test]
    async fn test_profile_uses_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .and(header("authorization", "Bearer a1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "user": user_json() })),
            )
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        let user = client.get_profile("a1").await.unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_logout_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        client.logout("a1").await.unwrap();
    }

    #[tokio::test]
    async fn test_oauth_exchange_failure_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/github/callback"))
            .and(body_json(json!({ "code": "c1", "state": "s1" })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Bad code" })))
            .mount(&server)
            .await;

        let client = AuthApiClient::new(&server.uri());
        let err = client.exchange_oauth_code("c1", "s1").await.unwrap_err();
        assert_eq!(err.to_string(), "Bad code");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/github/callback"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let client = AuthApiClient::new(&server.uri());
        let err = client.exchange_oauth_code("c1", "s1").await.unwrap_err();
        assert_eq!(err.to_string(), "OAuth callback failed");
    }
}
