//! Request outcome types
//!
//! Every call through the request layer settles to `Ok(data)` or
//! `Err(ApiError)`. Callers branch on [`ErrorStatus`]; only
//! `ErrorStatus::Http(401)` is ever acted on by the request layer itself.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// HTTP status code signalling an expired or invalid access token.
pub const UNAUTHORIZED: u16 = 401;

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The server answered with a non-2xx status.
    Http(u16),
    /// The request never produced a response (connectivity, DNS, timeout).
    FetchError,
    /// The server answered but the body could not be decoded.
    /// Carries the HTTP status of the undecodable response.
    ParsingError(u16),
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(status) => write!(f, "{status}"),
            Self::FetchError => f.write_str("FETCH_ERROR"),
            Self::ParsingError(_) => f.write_str("PARSING_ERROR"),
        }
    }
}

impl Serialize for ErrorStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Http(status) => serializer.serialize_u16(*status),
            Self::FetchError => serializer.serialize_str("FETCH_ERROR"),
            Self::ParsingError(_) => serializer.serialize_str("PARSING_ERROR"),
        }
    }
}

/// A failed API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    /// Failure classification.
    pub status: ErrorStatus,
    /// Parsed error body, when the server sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Transport or decoding message, when there is no server body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    /// An HTTP failure with the parsed error body.
    #[must_use]
    pub const fn http(status: u16, data: Option<Value>) -> Self {
        Self {
            status: ErrorStatus::Http(status),
            data,
            error: None,
        }
    }

    /// A 401 failure.
    #[must_use]
    pub const fn unauthorized(data: Option<Value>) -> Self {
        Self::http(UNAUTHORIZED, data)
    }

    /// A transport-level failure.
    #[must_use]
    pub fn fetch_error(message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::FetchError,
            data: None,
            error: Some(message.into()),
        }
    }

    /// A body that could not be decoded.
    #[must_use]
    pub fn parsing_error(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: ErrorStatus::ParsingError(status),
            data,
            error: Some(message.into()),
        }
    }

    /// Returns true for the one status that triggers reauthentication.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status, ErrorStatus::Http(UNAUTHORIZED))
    }

    /// Returns the HTTP status code, if the server answered at all.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self.status {
            ErrorStatus::Http(status) | ErrorStatus::ParsingError(status) => Some(status),
            ErrorStatus::FetchError => None,
        }
    }

    /// Returns the server-provided `message` field, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request failed ({})", self.status)?;
        if let Some(error) = &self.error {
            write!(f, ": {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Result of one API call: parsed JSON on success.
pub type ApiResult<T = Value> = Result<T, ApiError>;
