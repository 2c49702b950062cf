//! Application error types

use pulse_domain::{ApiError, DomainError};
use thiserror::Error;

use crate::ports::{HttpClientError, StorageError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// An API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The HTTP transport could not be set up.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpClientError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
