//! Policy error types.

use thiserror::Error;

/// Result type alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised while loading or querying policy data.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("unknown tier: {0}")]
    UnknownTier(String),

    #[error("unknown cell: {0}")]
    UnknownCell(String),

    #[error("tier '{tier}' weights must sum to 1.0 (got {sum})")]
    InvalidWeights { tier: String, sum: f64 },

    #[error("cell '{0}' has no candidates")]
    EmptyCell(String),

    #[error("failed to read policy config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse policy config: {0}")]
    Parse(#[from] toml::de::Error),
}
