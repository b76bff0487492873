//! Wire and domain types shared by the auth flows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated user as returned by the backend.
///
/// Replaced wholesale on login/profile fetch, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
    Guest,
}

/// Access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Error codes surfaced in the session and returned by the backend.
///
/// Codes this client does not know decode as [`AuthErrorCode::UnknownError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthErrorCode {
    OAuthFailed,
    OAuthCancelled,
    OAuthStateMismatch,
    GitHubApiError,
    InvalidCredentials,
    UserNotFound,
    EmailAlreadyExists,
    WeakPassword,
    InvalidEmail,
    TokenExpired,
    InvalidToken,
    InvalidAccessToken,
    InvalidRefreshToken,
    Unauthorized,
    ServerError,
    NetworkError,
    UnknownError,
}

impl AuthErrorCode {
    const ALL: [AuthErrorCode; 17] = [
        AuthErrorCode::OAuthFailed,
        AuthErrorCode::OAuthCancelled,
        AuthErrorCode::OAuthStateMismatch,
        AuthErrorCode::GitHubApiError,
        AuthErrorCode::InvalidCredentials,
        AuthErrorCode::UserNotFound,
        AuthErrorCode::EmailAlreadyExists,
        AuthErrorCode::WeakPassword,
        AuthErrorCode::InvalidEmail,
        AuthErrorCode::TokenExpired,
        AuthErrorCode::InvalidToken,
        AuthErrorCode::InvalidAccessToken,
        AuthErrorCode::InvalidRefreshToken,
        AuthErrorCode::Unauthorized,
        AuthErrorCode::ServerError,
        AuthErrorCode::NetworkError,
        AuthErrorCode::UnknownError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuthErrorCode::OAuthFailed => "OAUTH_FAILED",
            AuthErrorCode::OAuthCancelled => "OAUTH_CANCELLED",
            AuthErrorCode::OAuthStateMismatch => "OAUTH_STATE_MISMATCH",
            AuthErrorCode::GitHubApiError => "GITHUB_API_ERROR",
            AuthErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthErrorCode::UserNotFound => "USER_NOT_FOUND",
            AuthErrorCode::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AuthErrorCode::WeakPassword => "WEAK_PASSWORD",
            AuthErrorCode::InvalidEmail => "INVALID_EMAIL",
            AuthErrorCode::TokenExpired => "TOKEN_EXPIRED",
            AuthErrorCode::InvalidToken => "INVALID_TOKEN",
            AuthErrorCode::InvalidAccessToken => "INVALID_ACCESS_TOKEN",
            AuthErrorCode::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthErrorCode::Unauthorized => "UNAUTHORIZED",
            AuthErrorCode::ServerError => "SERVER_ERROR",
            AuthErrorCode::NetworkError => "NETWORK_ERROR",
            AuthErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == code)
            .unwrap_or(AuthErrorCode::UnknownError)
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AuthErrorCode {
    fn from(code: String) -> Self {
        AuthErrorCode::from_code(&code)
    }
}

impl From<AuthErrorCode> for String {
    fn from(code: AuthErrorCode) -> Self {
        code.as_str().to_string()
    }
}

/// Body returned by the login, signup, refresh and OAuth exchange endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    /// Older backends send the access token as `token`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<AuthErrorCode>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    /// The access token under either field name, `token` first.
    pub fn access_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or(self.access_token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Signup request body. The password confirmation is checked client-side
/// and never sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_decodes_camel_case_with_optional_fields() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "ada@example.com",
            "name": "Ada",
            "githubUsername": "ada",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "emailVerified": true,
            "roles": ["admin", "user"]
        }))
        .unwrap();

        assert_eq!(user.github_username.as_deref(), Some("ada"));
        assert!(user.avatar.is_none());
        assert!(user.last_login.is_none());
        assert!(user.has_role(Role::Admin));
        assert!(!user.has_role(Role::Guest));
    }

    #[test]
    fn test_error_code_wire_names() {
        assert_eq!(
            serde_json::to_value(AuthErrorCode::OAuthStateMismatch).unwrap(),
            json!("OAUTH_STATE_MISMATCH")
        );
        let code: AuthErrorCode = serde_json::from_value(json!("INVALID_ACCESS_TOKEN")).unwrap();
        assert_eq!(code, AuthErrorCode::InvalidAccessToken);
    }

    #[test]
    fn test_unknown_error_code_decodes_as_unknown() {
        let code: AuthErrorCode = serde_json::from_value(json!("RATE_LIMITED")).unwrap();
        assert_eq!(code, AuthErrorCode::UnknownError);
    }

    #[test]
    fn test_every_code_maps_back_to_itself() {
        for code in AuthErrorCode::ALL {
            assert_eq!(AuthErrorCode::from_code(code.as_str()), code);
        }
    }

    #[test]
    fn test_auth_response_prefers_token_alias() {
        let response: AuthResponse = serde_json::from_value(json!({
            "success": true,
            "token": "legacy",
            "accessToken": "modern"
        }))
        .unwrap();
        assert_eq!(response.access_token(), Some("legacy"));

        let response: AuthResponse =
            serde_json::from_value(json!({ "success": true, "accessToken": "modern" })).unwrap();
        assert_eq!(response.access_token(), Some("modern"));
        assert_eq!(response.refresh_token(), None);
    }

    #[test]
    fn test_signup_request_omits_absent_fields() {
        let body = serde_json::to_value(SignupRequest {
            email: "a@b.co".to_string(),
            password: "Secret123!".to_string(),
            name: Some("Ada".to_string()),
        })
        .unwrap();
        assert_eq!(body, json!({ "email": "a@b.co", "password": "Secret123!", "name": "Ada" }));
    }
}
