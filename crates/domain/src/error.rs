//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The request path is empty or malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The method cannot carry the request body.
    #[error("{0} requests cannot carry a body")]
    BodyNotAllowed(String),

    /// A header name is invalid.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// A tracking value is outside its accepted range.
    #[error("invalid measurement: {0}")]
    InvalidMeasurement(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
