//! Processing configuration.
//!
//! Handles loading, validating, and merging `processimage.toml`. Stock
//! defaults are the base layer; a config file overrides any subset of them,
//! and command-line flags override the file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! mode = "imagemagick"   # "gd" (in-process) or "imagemagick" (external convert)
//! quality = 100          # Output quality (0-100)
//! gamma = 1.0            # Gamma adjustment; 1.0 leaves pixels unchanged
//! gravity = "northwest"  # Anchor name, recorded with crop requests
//!
//! [convert]
//! path = "/opt/ImageMagick/bin/convert"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DEFAULT_CONVERT_PATH, Gravity, Mode, Settings, SettingsBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "processimage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `processimage.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessConfig {
    /// Backend selection.
    pub mode: Mode,
    /// Output quality (0 = worst, 100 = best).
    pub quality: u32,
    /// Gamma adjustment applied after resampling.
    pub gamma: f64,
    /// Anchor name.
    pub gravity: Gravity,
    /// External tool settings.
    pub convert: ConvertConfig,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            quality: 100,
            gamma: 1.0,
            gravity: Gravity::default(),
            convert: ConvertConfig::default(),
        }
    }
}

impl ProcessConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality > 100 {
            return Err(ConfigError::Validation("quality must be 0-100".into()));
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(ConfigError::Validation(
                "gamma must be a non-negative number".into(),
            ));
        }
        if self.convert.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "convert.path must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Seed a [`SettingsBuilder`] with every configured value.
    pub fn settings_builder(&self) -> SettingsBuilder {
        Settings::builder()
            .mode(self.mode)
            .quality(self.quality)
            .gamma(self.gamma)
            .gravity(self.gravity)
            .convert_path(&self.convert.path)
    }
}

/// External `convert` settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Path to the ImageMagick `convert` executable.
    pub path: PathBuf,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONVERT_PATH),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ProcessConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `processimage.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_toml(&config_path).map(Some)
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ProcessConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ProcessConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `processimage.toml` in `dir`, falling back to defaults.
pub fn load_config(dir: &Path) -> Result<ProcessConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Load config from an explicit file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<ProcessConfig, ConfigError> {
    resolve_config(stock_defaults_value(), Some(read_toml(path)?))
}

/// Returns a fully-commented stock `processimage.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# processimage configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# Backend used by scale and crop:
#   "gd"          - decode, resample and encode in-process (always writes JPEG)
#   "imagemagick" - run the external convert binary below
mode = "imagemagick"

# Output quality (0 = worst, 100 = best).
quality = 100

# Gamma adjustment applied after resampling. 1.0 leaves pixels unchanged,
# values above 1.0 brighten midtones. 0.0 is accepted as given.
gamma = 1.0

# Anchor name recorded with crop requests:
# northwest, north, northeast, west, center, east, southwest, south, southeast
gravity = "northwest"

# ---------------------------------------------------------------------------
# External tool
# ---------------------------------------------------------------------------
[convert]
# Path to the ImageMagick convert executable.
path = "/opt/ImageMagick/bin/convert"
"##
}
