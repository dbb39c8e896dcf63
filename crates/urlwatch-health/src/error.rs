//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur while building or running the scheduler.
///
/// Probe failures never appear here; they become health records.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("state store error: {0}")]
    State(#[from] urlwatch_state::StateError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
