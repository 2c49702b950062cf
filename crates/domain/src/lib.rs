//! Pulse Domain - Core types
//!
//! This crate defines the domain model shared by the Pulse request layer
//! and the typed endpoints built on top of it.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod profile;
pub mod request;
pub mod response;
pub mod tracking;

pub use auth::{Credentials, RefreshRequest, TokenGrant, TokenKey, token_preview};
pub use error::{DomainError, DomainResult};
pub use profile::{ProfileUpdate, UserProfile};
pub use request::{ApiRequest, HttpMethod};
pub use response::{ApiError, ApiResult, ErrorStatus};
pub use tracking::{DailySummary, WaterEntry, WeightEntry};
