//! `PERMSHEET_*` environment overrides.
//!
//! Env values win over the config file. Empty values are ignored.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::schema::SheetConfig;

pub const ENV_DISMISS_MODE: &str = "PERMSHEET_DISMISS_MODE";
pub const ENV_QUEUE_CAPACITY: &str = "PERMSHEET_QUEUE_CAPACITY";
pub const ENV_LOG_LEVEL: &str = "PERMSHEET_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "PERMSHEET_LOG_FORMAT";
pub const ENV_LOG_DIR: &str = "PERMSHEET_LOG_DIR";

/// Error returned for an env var whose value cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for env var \"{var_name}\": {message}")]
pub struct EnvOverrideError {
    pub var_name: String,
    pub message: String,
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: SheetConfig) -> Result<SheetConfig, EnvOverrideError> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: SheetConfig,
    env: &HashMap<String, String>,
) -> Result<SheetConfig, EnvOverrideError> {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(value) = get(ENV_DISMISS_MODE) {
        config.dismiss_mode = value.parse().map_err(|message| EnvOverrideError {
            var_name: ENV_DISMISS_MODE.to_string(),
            message,
        })?;
    }
    if let Some(value) = get(ENV_QUEUE_CAPACITY) {
        config.event_queue_capacity = value.parse().map_err(|e| EnvOverrideError {
            var_name: ENV_QUEUE_CAPACITY.to_string(),
            message: format!("{e}"),
        })?;
    }
    if let Some(value) = get(ENV_LOG_LEVEL) {
        config.logging.level = value.to_string();
    }
    if let Some(value) = get(ENV_LOG_FORMAT) {
        config.logging.format = value.parse().map_err(|message| EnvOverrideError {
            var_name: ENV_LOG_FORMAT.to_string(),
            message,
        })?;
    }
    if let Some(value) = get(ENV_LOG_DIR) {
        config.logging.dir = Some(PathBuf::from(value));
    }

    Ok(config)
}
