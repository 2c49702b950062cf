//! Water, weight and daily summary tracking.

use chrono::{NaiveDate, Utc};
use pulse_domain::{ApiError, ApiRequest, ApiResult, DailySummary, WaterEntry, WeightEntry};
use serde::Serialize;
use serde_json::Value;

use super::decode;
use crate::auth::ReauthCoordinator;
use crate::error::ApplicationResult;

const WATER_PATH: &str = "/tracking/water";
const WEIGHT_PATH: &str = "/tracking/weight";
const SUMMARY_PATH: &str = "/tracking/summary";

/// Tracking endpoints.
#[derive(Debug, Clone)]
pub struct TrackingApi {
    coordinator: ReauthCoordinator,
}

impl TrackingApi {
    /// Creates the endpoint group.
    #[must_use]
    pub const fn new(coordinator: ReauthCoordinator) -> Self {
        Self { coordinator }
    }

    /// Logs a water intake, timestamped now.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Domain` for an out-of-range amount, or
    /// `ApplicationError::Api` if the request fails.
    pub async fn log_water(&self, amount_ml: u32) -> ApplicationResult<Value> {
        let entry = WaterEntry::new(amount_ml, Utc::now())?;
        Ok(self.post(WATER_PATH, &entry).await?)
    }

    /// Logs a body weight, timestamped now.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Domain` for an implausible weight, or
    /// `ApplicationError::Api` if the request fails.
    pub async fn log_weight(&self, weight_kg: f64) -> ApplicationResult<Value> {
        let entry = WeightEntry::new(weight_kg, Utc::now())?;
        Ok(self.post(WEIGHT_PATH, &entry).await?)
    }

    /// Fetches the totals for one day.
    ///
    /// # Errors
    ///
    /// Returns the request error, or `ParsingError` for an unexpected body.
    pub async fn daily_summary(&self, date: NaiveDate) -> ApiResult<DailySummary> {
        let path = format!("{SUMMARY_PATH}?date={}", date.format("%Y-%m-%d"));
        let data = self.coordinator.request(&ApiRequest::get(path)).await?;
        decode(data)
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, entry: &T) -> ApiResult {
        let body = serde_json::to_value(entry).map_err(|e| ApiError::fetch_error(e.to_string()))?;
        self.coordinator.request(&ApiRequest::post(path, body)).await
    }
}
