//! Methods the Pulse API routes on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of an [`ApiRequest`](super::ApiRequest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Reads: profile, summaries.
    #[default]
    Get,
    /// Login, registration, refresh and new tracking entries.
    Post,
    /// Full replacement.
    Put,
    /// Partial profile updates.
    Patch,
    /// Removal.
    Delete,
}

impl HttpMethod {
    /// Whether a JSON body may travel with this method.
    ///
    /// GET bodies are dropped by most proxies, so the request layer refuses them.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        !matches!(self, Self::Get)
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
