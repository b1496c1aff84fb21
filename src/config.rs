//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `pipeline.toml`. User values are
//! layered over stock defaults, so a config file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = ""               # Target extension; empty keeps the source's
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [transformations]
//! enabled = []              # Allowed names; empty = every built-in
//!
//! [presets]
//! thumb = ["canvas:width=200,height=200,mode=center", "compress:quality=75"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::supported_extensions;
use crate::pipeline::{Invocation, Registry};
use crate::query::parse_chain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

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

/// Configuration loaded from `pipeline.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Output encoding settings.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Which transformations may be invoked.
    pub transformations: TransformationsConfig,
    /// Named chains, each a list of steps in chain syntax.
    pub presets: BTreeMap<String, Vec<String>>,
}

impl PipelineConfig {
    /// Validate config values against the built-in registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let builtins = Registry::with_defaults();

        if !self.output.format.is_empty()
            && !supported_extensions().contains(&self.output.format.to_ascii_lowercase().as_str())
        {
            return Err(ConfigError::Validation(format!(
                "output.format {:?} is not a supported image format",
                self.output.format
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if let Some(unknown) = self
            .transformations
            .enabled
            .iter()
            .find(|name| !builtins.contains(name))
        {
            return Err(ConfigError::Validation(format!(
                "transformations.enabled: unknown transformation {unknown:?}"
            )));
        }
        for (preset, steps) in &self.presets {
            let chain = parse_chain(steps)
                .map_err(|e| ConfigError::Validation(format!("presets.{preset}: {e}")))?;
            if let Some(step) = chain.iter().find(|inv| !builtins.contains(&inv.name)) {
                return Err(ConfigError::Validation(format!(
                    "presets.{preset}: unknown transformation {:?}",
                    step.name
                )));
            }
        }
        Ok(())
    }

    /// Registry of the transformations this config allows.
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        let builtins = Registry::with_defaults();
        if self.transformations.enabled.is_empty() {
            return Ok(builtins);
        }
        builtins
            .restrict_to(self.transformations.enabled.as_slice())
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Parsed steps of a named preset.
    pub fn preset(&self, name: &str) -> Result<Vec<Invocation>, ConfigError> {
        let steps = self
            .presets
            .get(name)
            .ok_or_else(|| ConfigError::Validation(format!("unknown preset {name:?}")))?;
        parse_chain(steps).map_err(|e| ConfigError::Validation(format!("presets.{name}: {e}")))
    }

    /// Configured output extension, if one is set.
    pub fn output_format(&self) -> Option<&str> {
        Some(self.output.format.as_str()).filter(|f| !f.is_empty())
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Extension to encode results as. Empty keeps each source's own.
    pub format: String,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
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

/// Transformation allow-list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformationsConfig {
    pub enabled: Vec<String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when it is missing.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `pipeline.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgxform Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Extension to encode results as (png, jpg, gif, bmp, tiff, webp).
# Empty keeps the extension of each source file.
format = ""

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers for `batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Transformations
# ---------------------------------------------------------------------------
[transformations]
# Names that may be invoked. Empty allows every built-in:
# canvas, compress, crop, flip-horizontally, flip-vertically, resize, rotate
enabled = []

# ---------------------------------------------------------------------------
# Presets
# ---------------------------------------------------------------------------
# Named chains, applied with --preset NAME. Each step is
# `name` or `name:key=value,key=value`.
[presets]
# thumb = ["canvas:width=200,height=200,mode=center,bg=fff", "compress:quality=75"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_allows_everything() {
        let config = PipelineConfig::default();
        assert!(config.transformations.enabled.is_empty());
        assert!(config.presets.is_empty());
        assert_eq!(config.output_format(), None);
        assert!(config.registry().unwrap().contains("canvas"));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[output]
format = "jpg"
"#;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output_format(), Some("jpg"));
        // Defaults preserved
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("[output]\nformt = \"png\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn merge_toml_overlays_nested_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n[b]\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
        assert_eq!(merged["b"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn effective_threads_clamps_down_only() {
        let cores = effective_threads(&ProcessingConfig::default());
        assert!(cores >= 1);
        let one = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&one), 1);
        let huge = ProcessingConfig {
            max_processes: Some(100_000),
        };
        assert_eq!(effective_threads(&huge), cores);
    }

    // =========================================================================
    // validation
    // =========================================================================

    #[test]
    fn validate_rejects_unknown_enabled_name() {
        let mut config = PipelineConfig::default();
        config.transformations.enabled = vec!["canvas".into(), "sepia".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sepia"));
    }

    #[test]
    fn validate_rejects_bad_preset_step() {
        let mut config = PipelineConfig::default();
        config
            .presets
            .insert("broken".into(), vec!["canvas:width".into()]);
        assert!(config.validate().is_err());

        config.presets.insert("broken".into(), vec!["sepia".into()]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("presets.broken"));
    }

    #[test]
    fn validate_rejects_unsupported_output_format() {
        let mut config = PipelineConfig::default();
        config.output.format = "psd".into();
        assert!(config.validate().is_err());
        config.output.format = "PNG".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = PipelineConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn registry_honours_enabled_list() {
        let mut config = PipelineConfig::default();
        config.transformations.enabled = vec!["rotate".into()];
        let registry = config.registry().unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["rotate"]);
    }

    #[test]
    fn preset_parses_steps() {
        let mut config = PipelineConfig::default();
        config.presets.insert(
            "thumb".into(),
            vec!["canvas:width=20,height=20".into(), "compress:quality=75".into()],
        );
        let chain = config.preset("thumb").unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].params.get("quality"), Some("75"));
        assert!(config.preset("missing").is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("pipeline.toml")).unwrap();
        assert!(config.presets.is_empty());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pipeline.toml");
        fs::write(
            &path,
            r#"
[processing]
max_processes = 2

[presets]
square = ["canvas:width=64,height=64,mode=center"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.preset("square").unwrap()[0].name, "canvas");
        // Unspecified values should be defaults
        assert_eq!(config.output_format(), None);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pipeline.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pipeline.toml");
        fs::write(&path, "[transformations]\nenabled = [\"blur\"]\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_parses_and_validates() {
        let config: PipelineConfig = toml::from_str(stock_config_toml()).unwrap();
        config.validate().unwrap();
    }
}
