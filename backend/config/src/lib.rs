//! `rotalog-config` — configuration for the rotalog logger.
//!
//! Provides:
//! - Typed config schema (logger + tracing subscriber)
//! - YAML / JSON / TOML loading
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation report

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::{apply_all_defaults, DEFAULT_HEADER};
pub use env::{
    collect_referenced_vars, contains_env_var_reference, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::{LoggerConfig, RotalogConfig, TracingConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport, HEADER_PLACEHOLDERS};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load, apply env substitution, apply defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Validation
/// warnings and errors are logged; errors also fail the load.
pub fn load_and_prepare(path: &Path) -> Result<RotalogConfig> {
    let raw_config = load_config(path)?;

    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: RotalogConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        return Err(first).context(format!("Invalid config at {}", path.display()));
    }

    Ok(config)
}
