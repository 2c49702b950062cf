//! Authentication domain types

mod types;

pub use types::{Credentials, RefreshRequest, TokenGrant, TokenKey, token_preview};
