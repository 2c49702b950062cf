//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ApplicationError, ApplicationResult};

/// Settings for the request layer.
///
/// Loaded by the infrastructure layer from defaults, an optional file and
/// `PULSE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL relative request paths are joined to.
    pub api_base_url: String,
    /// Path of the token refresh endpoint.
    pub refresh_path: String,
    /// Transport timeout for ordinary requests, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout for the refresh call, in seconds.
    pub refresh_timeout_secs: u64,
    /// Maximum 401 -> refresh -> retry cycles per logical call.
    pub max_reauth_cycles: u32,
    /// Where the token store persists. `None` means the platform data dir.
    pub token_store_path: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            request_timeout_secs: 30,
            refresh_timeout_secs: 15,
            max_reauth_cycles: 1,
            token_store_path: None,
            log_filter: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a config pointing at the given API base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Per-request transport timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Refresh call timeout.
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Retry ceiling, never below one cycle.
    #[must_use]
    pub fn reauth_cycles(&self) -> u32 {
        self.max_reauth_cycles.max(1)
    }

    /// Checks the settings for obvious mistakes.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Config` describing the first problem found.
    pub fn validate(&self) -> ApplicationResult<()> {
        let base = url::Url::parse(&self.api_base_url).map_err(|e| {
            ApplicationError::Config(format!("invalid api_base_url '{}': {e}", self.api_base_url))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApplicationError::Config(format!(
                "api_base_url must be http(s), got '{}'",
                base.scheme()
            )));
        }
        if !self.refresh_path.starts_with('/') {
            return Err(ApplicationError::Config(format!(
                "refresh_path must start with '/', got '{}'",
                self.refresh_path
            )));
        }
        if self.request_timeout_secs == 0 || self.refresh_timeout_secs == 0 {
            return Err(ApplicationError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
