//! Error types for the urlwatch state store.

use thiserror::Error;
use urlwatch_core::ValidationError;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Failures of the monitor registry and the health record log.
///
/// redb failures carry the backend's message; `Invalid` carries the
/// rejected registration input.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("cannot open urlwatch database: {0}")]
    Open(String),

    #[error("urlwatch database transaction failed: {0}")]
    Transaction(String),

    #[error("monitor or health record table unavailable: {0}")]
    Table(String),

    #[error("failed to read monitors or health records: {0}")]
    Read(String),

    #[error("failed to persist monitor or health record: {0}")]
    Write(String),

    #[error("cannot encode stored monitor or health record: {0}")]
    Serialize(String),

    #[error("corrupt stored monitor or health record: {0}")]
    Deserialize(String),

    #[error("invalid monitor: {0}")]
    Invalid(#[from] ValidationError),
}
