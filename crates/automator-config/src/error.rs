//! Core error types for configuration and paths.

use thiserror::Error;

/// Error type for configuration and filesystem layout operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or invalid setting.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Malformed `config.json`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The home directory could not be resolved.
    #[error("Path error: {0}")]
    Path(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CoreError::Config("GitHub OAuth client ID not configured".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: GitHub OAuth client ID not configured"
        );
    }

    #[test]
    fn test_url_error_converts() {
        let err: CoreError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, CoreError::InvalidUrl(_)));
    }
}
