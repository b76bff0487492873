//! Error types for the auth session crate.

use crate::types::AuthErrorCode;
use automator_config::CoreError;
use serde::{Deserialize, Serialize};
use session_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Normalized backend API failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status, or 0 when the request never produced a response.
    pub status: u16,
    pub code: AuthErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Transport or decoding failure with no usable response.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, AuthErrorCode::NetworkError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (HTTP {}, {})", self.message, self.status, self.code)
    }
}

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Backend API returned an error (or could not be reached)
    #[error("{0}")]
    Api(ApiError),

    /// Request was rejected with 401/403; the session has been cleared
    #[error("Authentication required. Please sign in again.")]
    AuthenticationRequired,

    /// GitHub reported an error on the callback
    #[error("GitHub OAuth error: {0}")]
    OAuthProvider(String),

    #[error("No authorization code received from GitHub")]
    MissingAuthorizationCode,

    #[error("OAuth state mismatch - possible CSRF attack")]
    OAuthStateMismatch,

    /// Code exchange was rejected by the backend
    #[error("{0}")]
    OAuthExchange(String),

    /// A successful response was missing required fields
    #[error("{0}")]
    InvalidResponse(String),

    /// Client-side input validation failed
    #[error("{message}")]
    Validation {
        code: AuthErrorCode,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        AuthError::Api(err)
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(msg) => AuthError::Config(msg),
            CoreError::InvalidUrl(e) => AuthError::InvalidUrl(e),
            other => AuthError::Config(other.to_string()),
        }
    }
}

impl AuthError {
    pub fn validation(code: AuthErrorCode, message: impl Into<String>) -> Self {
        AuthError::Validation {
            code,
            message: message.into(),
        }
    }

    /// The code recorded in the session when this error ends a flow.
    pub fn error_code(&self) -> AuthErrorCode {
        match self {
            AuthError::Api(e) => e.code,
            AuthError::AuthenticationRequired => AuthErrorCode::Unauthorized,
            AuthError::OAuthProvider(msg) if msg.contains("access_denied") => {
                AuthErrorCode::OAuthCancelled
            }
            AuthError::OAuthProvider(_)
            | AuthError::MissingAuthorizationCode
            | AuthError::OAuthExchange(_) => AuthErrorCode::OAuthFailed,
            AuthError::OAuthStateMismatch => AuthErrorCode::OAuthStateMismatch,
            AuthError::Validation { code, .. } => *code,
            AuthError::Http(_) => AuthErrorCode::NetworkError,
            AuthError::InvalidResponse(_)
            | AuthError::Config(_)
            | AuthError::Storage(_)
            | AuthError::Json(_)
            | AuthError::InvalidUrl(_)
            | AuthError::InvalidStateTransition(_) => AuthErrorCode::UnknownError,
        }
    }

    /// True for backend errors meaning the access token is no longer usable.
    pub fn is_token_expired(&self) -> bool {
        matches!(
            self,
            AuthError::Api(ApiError {
                code: AuthErrorCode::TokenExpired | AuthErrorCode::InvalidAccessToken,
                ..
            })
        )
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Api(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
