//! Water, weight and daily summary tracking types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Largest single water entry accepted, in millilitres.
pub const MAX_WATER_ENTRY_ML: u32 = 5_000;

/// One logged glass of water.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterEntry {
    /// Amount in millilitres.
    pub amount_ml: u32,
    /// When it was drunk.
    pub logged_at: DateTime<Utc>,
}

impl WaterEntry {
    /// Creates a validated entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidMeasurement` for zero or implausibly
    /// large amounts.
    pub fn new(amount_ml: u32, logged_at: DateTime<Utc>) -> DomainResult<Self> {
        if amount_ml == 0 || amount_ml > MAX_WATER_ENTRY_ML {
            return Err(DomainError::InvalidMeasurement(format!(
                "water amount must be between 1 and {MAX_WATER_ENTRY_ML} ml, got {amount_ml}"
            )));
        }
        Ok(Self {
            amount_ml,
            logged_at,
        })
    }
}

/// One weigh-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// When it was measured.
    pub logged_at: DateTime<Utc>,
}

impl WeightEntry {
    /// Creates a validated entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidMeasurement` for non-finite or
    /// out-of-range weights.
    pub fn new(weight_kg: f64, logged_at: DateTime<Utc>) -> DomainResult<Self> {
        if !weight_kg.is_finite() || !(20.0..=500.0).contains(&weight_kg) {
            return Err(DomainError::InvalidMeasurement(format!(
                "weight must be between 20 and 500 kg, got {weight_kg}"
            )));
        }
        Ok(Self {
            weight_kg,
            logged_at,
        })
    }
}

/// Totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// The day summarised.
    pub date: NaiveDate,
    /// Water drunk, in millilitres.
    #[serde(default)]
    pub water_ml: u32,
    /// Energy eaten, in kilocalories.
    #[serde(default)]
    pub calories_in: u32,
    /// Energy burnt through exercise, in kilocalories.
    #[serde(default)]
    pub calories_out: u32,
    /// Latest weight of the day, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}
