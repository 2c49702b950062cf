//! Credential and token types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The three keys the token store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    /// Short-lived bearer credential.
    AccessToken,
    /// Longer-lived credential exchanged for a new pair.
    RefreshToken,
    /// Cached user object, serialized as JSON.
    User,
}

impl TokenKey {
    /// All keys, in write order.
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::User];

    /// Returns the storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::User => "user",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of everything the token store holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    /// Current access token.
    pub access_token: Option<String>,
    /// Current refresh token.
    pub refresh_token: Option<String>,
    /// Cached user object.
    pub user: Option<Value>,
}

impl Credentials {
    /// Returns true if nothing is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }

    /// Returns true if a session was ever established (an access token exists).
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.access_token.is_some()
    }

    /// Returns true if the session can be renewed.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// A new token pair issued by login, registration, or refresh.
///
/// Wire shape: `{ "access_token": "...", "refresh_token": "...", "data": {...}? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// New access token.
    pub access_token: String,
    /// New refresh token.
    pub refresh_token: String,
    /// Updated user object, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl TokenGrant {
    /// Creates a grant without a user object.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            data: None,
        }
    }

    /// Attaches a user object.
    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.data = Some(user);
        self
    }

    /// Extracts a grant from a response body, if it carries one.
    ///
    /// Blank tokens do not count as a grant.
    #[must_use]
    pub fn from_body(body: &Value) -> Option<Self> {
        let grant: Self = serde_json::from_value(body.clone()).ok()?;
        if grant.access_token.is_empty() || grant.refresh_token.is_empty() {
            return None;
        }
        Some(grant)
    }
}

/// Body sent to the refresh endpoint: `{ "refreshToken": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token being exchanged.
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Returns a log-safe preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 {
        let cut = token
            .char_indices()
            .nth(8)
            .map_or(token.len(), |(index, _)| index);
        format!("{}...", &token[..cut])
    } else {
        "***".to_string()
    }
}
