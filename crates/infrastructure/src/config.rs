//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. `ClientConfig` defaults
//! 2. An optional config file (`pulse.toml`, `pulse.json`, ... in the
//!    working directory, or an explicit path)
//! 3. `PULSE_*` environment variables, e.g. `PULSE_API_BASE_URL`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use pulse_application::{ApplicationError, ClientConfig};
use thiserror::Error;

const ENV_PREFIX: &str = "PULSE";
const DEFAULT_FILE_STEM: &str = "pulse";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged settings are invalid.
    #[error(transparent)]
    Invalid(#[from] ApplicationError),
}

/// Loads and validates the client configuration from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if a source is malformed or the result is invalid.
pub fn load_config(file: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    load_config_from(file, None)
}

/// Same as [`load_config`], reading environment variables from `env`
/// instead of the process when given.
///
/// # Errors
///
/// Returns `ConfigError` if a source is malformed or the result is invalid.
pub fn load_config_from(
    file: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<ClientConfig, ConfigError> {
    let file_source = match file {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_FILE_STEM).required(false),
    };

    let settings = Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        )
        .build()?;

    let config: ClientConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Where the session file lives: the configured path, or
/// `<data dir>/pulse/session.json`.
#[must_use]
pub fn session_path(config: &ClientConfig) -> PathBuf {
    config.token_store_path.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("pulse")
            .join("session.json")
    })
}
