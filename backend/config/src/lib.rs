//! `timbang-config` — runtime settings for the Timbang pipeline.
//!
//! Provides:
//! - Typed settings schema with per-component sections and defaults
//! - YAML loading with `${ENV_VAR}` substitution for secrets
//! - Validation with field-path error messages
//!
//! The resulting `Settings` struct is built once at process start and
//! passed by reference into every component.

pub mod env;
pub mod schema;
pub mod validation;

pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use schema::{
    ArchiveSettings, CategorizeSettings, LedgerSettings, LoggingSettings, MediaSettings,
    PipelineSettings, Settings, VisionSettings,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

/// Load settings from a YAML file: parse, substitute `${VAR}` env vars,
/// apply defaults for absent sections, and validate.
///
/// Warnings are logged; errors fail the load — a pipeline with a missing
/// spreadsheet id or API key cannot do useful work.
pub async fn load_settings(path: &Path) -> Result<Settings> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse settings YAML at: {}", path.display()))?;

    let value = resolve_env_vars(&value).context("Failed to resolve env vars in settings")?;

    let settings: Settings =
        serde_json::from_value(value).context("Failed to deserialize settings")?;

    let report = validate(&settings);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Settings warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Settings error");
        }
        bail!("Invalid settings: {} error(s) in {}", report.errors.len(), path.display());
    }

    Ok(settings)
}
