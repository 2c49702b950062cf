//! The signed-in user's profile.

use pulse_domain::{ApiError, ApiRequest, ApiResult, ProfileUpdate, UserProfile};
use serde_json::Value;

use super::decode;
use crate::auth::ReauthCoordinator;

const ME_PATH: &str = "/users/me";

/// Profile endpoints. Every successful read or write refreshes the cached user.
#[derive(Debug, Clone)]
pub struct ProfileApi {
    coordinator: ReauthCoordinator,
}

impl ProfileApi {
    /// Creates the endpoint group.
    #[must_use]
    pub const fn new(coordinator: ReauthCoordinator) -> Self {
        Self { coordinator }
    }

    /// Fetches the current user's profile.
    ///
    /// # Errors
    ///
    /// Returns the request error, or `ParsingError` for an unexpected body.
    pub async fn me(&self) -> ApiResult<UserProfile> {
        let data = self.coordinator.request(&ApiRequest::get(ME_PATH)).await?;
        self.cache(data).await
    }

    /// Applies a partial update and returns the updated profile.
    ///
    /// An empty update is not sent; the current profile is fetched instead.
    ///
    /// # Errors
    ///
    /// Returns the request error, or `ParsingError` for an unexpected body.
    pub async fn update(&self, patch: &ProfileUpdate) -> ApiResult<UserProfile> {
        if patch.is_empty() {
            return self.me().await;
        }
        let body =
            serde_json::to_value(patch).map_err(|e| ApiError::fetch_error(e.to_string()))?;
        let data = self
            .coordinator
            .request(&ApiRequest::patch(ME_PATH, body))
            .await?;
        self.cache(data).await
    }

    async fn cache(&self, data: Value) -> ApiResult<UserProfile> {
        let profile: UserProfile = decode(data.clone())?;
        let _ = self.coordinator.token_store().set_user(&data).await;
        Ok(profile)
    }
}
