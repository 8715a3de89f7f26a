//! Product registry and validation error types.

use thiserror::Error;

/// Errors raised during product registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("product '{0}' is already registered")]
    DuplicateProduct(String),
}

/// A single parameter validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{0} is required")]
    MissingParameter(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("{name} must be a {expected}")]
    InvalidParameterType { name: String, expected: &'static str },

    #[error("{name} must be >= {min}")]
    BelowMinimum { name: String, min: i64 },

    #[error("{name} must be <= {max}")]
    AboveMaximum { name: String, max: i64 },

    #[error("{name} must be one of {choices:?}")]
    InvalidChoice { name: String, choices: Vec<String> },
}
