//! `permsheet-config`: permission sheet runtime configuration.
//!
//! Provides:
//! - Typed config schema (dismissal policy, event queue, logging)
//! - YAML loading
//! - `PERMSHEET_*` environment overrides
//! - Validation with field paths

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_with, EnvOverrideError};
pub use io::load_config;
pub use schema::{DismissMode, LogFormat, LoggingConfig, SheetConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load a config file, apply env overrides, and validate.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<SheetConfig> {
    let config = load_with_env(path).await?;
    check(&config)?;
    Ok(config)
}

/// Load a config file and apply env overrides without validating.
///
/// Lets the caller install a logger from the result before [`check`] reports.
pub async fn load_with_env(path: &Path) -> Result<SheetConfig> {
    let config = load_config(path).await?;
    Ok(apply_env_overrides(config)?)
}

/// Validate, logging every finding. Fails if any error was found.
pub fn check(config: &SheetConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("invalid configuration: {} error(s)", report.errors.len());
    }
    Ok(())
}
