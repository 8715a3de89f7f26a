//! Experiment engine error types.

use thiserror::Error;

/// Result type alias for experiment operations.
pub type ExperimentResult<T> = Result<T, ExperimentError>;

/// Errors raised by experiment CRUD.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("experiment '{0}' already exists")]
    DuplicateId(String),

    #[error("experiment '{0}' not found")]
    NotFound(String),

    #[error("traffic_percentage must be between 0.0 and 1.0 (got {0})")]
    InvalidTraffic(f64),

    #[error("variant weights must sum to 1.0 (got {0})")]
    InvalidWeights(f64),
}
