//! Typed endpoint groups.
//!
//! Each group is a thin wrapper over [`crate::ReauthCoordinator::request`]: it builds
//! the request, decodes the JSON, and never retries on its own.

mod auth;
mod profile;
mod tracking;

pub use auth::AuthApi;
pub use profile::ProfileApi;
pub use tracking::TrackingApi;

use pulse_domain::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Status reported when a 2xx body does not match the expected shape.
const DECODED_STATUS: u16 = 200;

fn decode<T: DeserializeOwned>(data: Value) -> ApiResult<T> {
    T::deserialize(&data)
        .map_err(|e| ApiError::parsing_error(DECODED_STATUS, e.to_string(), Some(data)))
}
