//! Authentication module for the Pulse request layer.
//!
//! This module provides:
//! - The persisted token store with its fail-open/fail-silent contract
//! - The process-wide "unauthorized" notification channel
//! - The reauthentication coordinator (single-flight refresh on 401)

mod reauth;
mod token_store;
mod unauthorized;

pub use reauth::{ReauthCoordinator, RefreshOutcome};
pub use token_store::{StorageFault, StorageFaultHook, StorageOperation, TokenStore};
pub use unauthorized::{Subscription, UnauthorizedChannel, UnauthorizedListener, UnauthorizedSignal};
