use auth_session::AuthError;
use session_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    /// Request failed, including a rejected session
    #[error("{0}")]
    Api(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

pub type FleetResult<T> = Result<T, FleetError>;
