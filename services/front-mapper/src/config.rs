//! Mapper configuration.
//!
//! Loaded from a YAML file; `${VAR}` and `${VAR:-default}` references are
//! substituted from the environment before parsing. A file without a
//! `detector` block takes its detector settings from the `BOA_*` environment
//! variables; keys left out of a `detector` block take the built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use front_engine::cache::DEFAULT_MEMORY_LIMIT;
use front_engine::DetectorConfig;

use crate::filter::{BoundingBox, OutputFilter, ValueRange};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Directory scanned (recursively) for granules.
    pub input_dir: PathBuf,

    /// Root of the `<YYYY-MM>/` output tree.
    pub output_dir: PathBuf,

    /// Variable name used in output file names.
    #[serde(default = "default_variable")]
    pub variable: String,

    /// `BOA_*` environment settings when the block is absent.
    #[serde(default = "DetectorConfig::from_env")]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub bbox: BoundingBox,

    #[serde(default = "default_value_range")]
    pub value_range: ValueRange,

    /// Worker threads for the granule fan-out; 0 uses every core.
    #[serde(default)]
    pub threads: usize,

    /// Memory bound of the geometry cache.
    #[serde(default = "default_cache_mb")]
    pub cache_memory_mb: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

fn default_variable() -> String {
    "chlor".to_string()
}

fn default_value_range() -> ValueRange {
    ValueRange::new(None, Some(40.0))
}

fn default_cache_mb() -> usize {
    DEFAULT_MEMORY_LIMIT / (1024 * 1024)
}

impl MapperConfig {
    /// Configuration for `input_dir` -> `output_dir` with every other field
    /// at its default.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            variable: default_variable(),
            detector: DetectorConfig::from_env(),
            bbox: BoundingBox::default(),
            value_range: default_value_range(),
            threads: 0,
            cache_memory_mb: default_cache_mb(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self = serde_yaml::from_str(&expanded).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid detector settings: {}", e))?;

        anyhow::ensure!(!self.variable.is_empty(), "Variable name cannot be empty");
        anyhow::ensure!(
            !self.variable.contains(['/', '\\']),
            "Variable name cannot contain path separators: {}",
            self.variable
        );

        anyhow::ensure!(
            self.bbox.min_lat < self.bbox.max_lat,
            "bbox.min_lat must be less than bbox.max_lat"
        );
        anyhow::ensure!(
            (-90.0..=90.0).contains(&self.bbox.min_lat) && (-90.0..=90.0).contains(&self.bbox.max_lat),
            "bbox latitudes must lie within [-90, 90]"
        );

        if let (Some(min), Some(max)) = (self.value_range.min, self.value_range.max) {
            anyhow::ensure!(min < max, "value_range.min must be less than value_range.max");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        anyhow::ensure!(
            valid_levels.contains(&self.logging.level.as_str()),
            "Invalid log level: {}. Must be one of: {:?}",
            self.logging.level,
            valid_levels
        );

        let valid_formats = ["json", "pretty"];
        anyhow::ensure!(
            valid_formats.contains(&self.logging.format.as_str()),
            "Invalid log format: {}. Must be one of: {:?}",
            self.logging.format,
            valid_formats
        );

        Ok(())
    }

    pub fn output_filter(&self) -> OutputFilter {
        OutputFilter::new(self.bbox, self.value_range, self.detector.fill_value)
    }

    pub fn cache_memory_bytes(&self) -> usize {
        self.cache_memory_mb * 1024 * 1024
    }
}

/// Substitute `${VAR}` / `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
