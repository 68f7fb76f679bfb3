//! Run configuration.
//!
//! Handles loading, validating, and merging `trimpress.toml`. Configuration
//! is layered: stock defaults are overridden by the config file, which is
//! overridden by command-line flags. Every layer is a sparse TOML table
//! merged with [`merge_toml`] before the result is deserialized once.
//!
//! ## Config File Location
//!
//! `--config <FILE>` names the file explicitly (it must exist). Without the
//! flag, `trimpress.toml` in the working directory is used when present;
//! otherwise the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! input = "originals"       # Directory scanned for source images
//! output = "optimized"      # Directory receiving .webp files (created if missing)
//!
//! [trim]
//! threshold = 100           # Max per-channel difference still treated as border (0-255)
//!
//! [resize]
//! height = 700              # Output height in pixels; width follows aspect ratio
//!
//! [encode]
//! quality = 80              # WebP quality (0-100)
//! effort = 6                # WebP method (0 = fastest, 6 = smallest)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    EncodeSpec, Effort, OutputFormat, PipelineSpec, Quality, ResizeSpec, TrimSpec,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "trimpress.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration for one run.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input and output directories.
    pub paths: PathsConfig,
    /// Border trimming.
    pub trim: TrimConfig,
    /// Height normalisation.
    pub resize: ResizeConfig,
    /// WebP encoding.
    pub encode: EncodeConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trim.threshold > u8::MAX as u32 {
            return Err(ConfigError::Validation(
                "trim.threshold must be 0-255".into(),
            ));
        }
        let max_height = OutputFormat::WebP.max_dimension();
        if self.resize.height == 0 || self.resize.height > max_height {
            return Err(ConfigError::Validation(format!(
                "resize.height must be 1-{max_height}"
            )));
        }
        if self.encode.quality > Quality::MAX {
            return Err(ConfigError::Validation(
                "encode.quality must be 0-100".into(),
            ));
        }
        if self.encode.effort > Effort::MAX {
            return Err(ConfigError::Validation("encode.effort must be 0-6".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Transform parameters described by this config.
    pub fn pipeline_spec(&self) -> PipelineSpec {
        PipelineSpec {
            trim: TrimSpec {
                threshold: u8::try_from(self.trim.threshold).unwrap_or(u8::MAX),
            },
            resize: ResizeSpec::new(self.resize.height, OutputFormat::WebP),
            encode: EncodeSpec {
                format: OutputFormat::WebP,
                quality: Quality::new(self.encode.quality),
                effort: Effort::new(self.encode.effort),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("originals"),
            output: PathBuf::from("optimized"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimConfig {
    /// Largest per-channel difference from the corner pixel still trimmed.
    pub threshold: u32,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self { threshold: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Output height in pixels.
    pub height: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self { height: 700 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeConfig {
    /// WebP quality (0 = worst, 100 = best).
    pub quality: u32,
    /// WebP method (0 = fastest, 6 = smallest output).
    pub effort: u32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            effort: 6,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file layer.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is used
/// when present in the working directory.
pub fn load_file_layer(explicit: Option<&Path>) -> Result<Option<toml::Value>, ConfigError> {
    match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Ok(Some(toml::from_str(&content)?))
        }
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

/// Load config from a file (if any), merged on top of stock defaults and
/// validated.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_file_layer(explicit)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `trimpress.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# trimpress configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override values from this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths
# ---------------------------------------------------------------------------
[paths]
# Directory scanned (non-recursively) for .jpg/.jpeg/.png/.tif/.tiff/.webp files.
input = "originals"

# Directory receiving <name>.webp outputs. Created if missing.
# Existing files with the same name are overwritten.
output = "optimized"

# ---------------------------------------------------------------------------
# Trim
# ---------------------------------------------------------------------------
[trim]
# Border pixels within this per-channel distance of the top-left pixel are
# cropped away (0-255). A fully uniform image is left untouched.
threshold = 100

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[resize]
# Output height in pixels (1-16383). Width follows the trimmed aspect ratio
# and must also fit within 16383, or the file fails at the resize stage.
# Shorter images are scaled up.
height = 700

# ---------------------------------------------------------------------------
# Encode
# ---------------------------------------------------------------------------
[encode]
# WebP quality (0 = worst, 100 = best).
quality = 80

# WebP method: 0 = fastest, 6 = slowest but smallest.
effort = 6

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
