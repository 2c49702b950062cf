//! API request domain types
//!
//! An [`ApiRequest`] is the `{ url, method, body, headers }` shape every typed
//! endpoint hands to the request layer. Paths are relative to the configured
//! API base URL unless they are already absolute.

mod method;

pub use method::HttpMethod;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{DomainError, DomainResult};

/// A single call against the backend API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the API base URL (e.g. `/users/me`), or an absolute URL.
    pub path: String,
    /// Optional JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Extra headers. An explicit `Authorization` header here wins over the
    /// stored bearer token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ApiRequest {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// Creates a PUT request with a JSON body.
    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(body)
    }

    /// Creates a PATCH request with a JSON body.
    #[must_use]
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_body(body)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns true if the caller supplied its own `Authorization` header.
    #[must_use]
    pub fn has_authorization(&self) -> bool {
        self.headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("authorization"))
    }

    /// Returns true if the path is already an absolute http(s) URL.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }

    /// Validates the path and header names.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` if the path is empty or a relative path does
    /// not start with `/`. A GET carrying a body and an empty or
    /// whitespace-bearing header name are rejected too.
    pub fn validate(&self) -> DomainResult<()> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(DomainError::InvalidPath("path is empty".to_string()));
        }
        if !self.is_absolute() && !path.starts_with('/') {
            return Err(DomainError::InvalidPath(format!(
                "relative path must start with '/': {path}"
            )));
        }
        if self.body.is_some() && !self.method.allows_body() {
            return Err(DomainError::BodyNotAllowed(self.method.to_string()));
        }
        if let Some(name) = self
            .headers
            .keys()
            .find(|name| name.is_empty() || name.chars().any(char::is_whitespace))
        {
            return Err(DomainError::InvalidHeaderName(name.clone()));
        }
        Ok(())
    }

    /// Joins this request's path onto a base URL.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        if self.is_absolute() {
            return self.path.clone();
        }
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_url_joins_base_and_path() {
        let request = ApiRequest::get("/users/me");
        assert_eq!(
            request.url("https://api.example.com/v1/"),
            "https://api.example.com/v1/users/me"
        );
    }

    #[test]
    fn test_absolute_path_is_kept() {
        let request = ApiRequest::get("https://other.example.com/ping");
        assert!(request.is_absolute());
        assert_eq!(
            request.url("https://api.example.com"),
            "https://other.example.com/ping"
        );
    }

    #[test]
    fn test_validate_rejects_relative_without_slash() {
        let request = ApiRequest::get("users/me");
        assert!(matches!(
            request.validate(),
            Err(DomainError::InvalidPath(_))
        ));
        assert!(ApiRequest::get("  ").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_header_name() {
        let request = ApiRequest::get("/x").with_header("X Bad", "1");
        assert_eq!(
            request.validate(),
            Err(DomainError::InvalidHeaderName("X Bad".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_get_with_body() {
        let request = ApiRequest::get("/tracking/summary").with_body(json!({"date": "2026-01-01"}));
        assert_eq!(
            request.validate(),
            Err(DomainError::BodyNotAllowed("GET".to_string()))
        );
        assert!(ApiRequest::delete("/x").with_body(json!({})).validate().is_ok());
    }

    #[test]
    fn test_has_authorization_is_case_insensitive() {
        let request = ApiRequest::post("/auth/login", json!({}))
            .with_header("authorization", "Basic abc");
        assert!(request.has_authorization());
        assert!(!ApiRequest::get("/x").has_authorization());
    }
}
