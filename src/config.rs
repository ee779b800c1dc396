//! SDK configuration
//!
//! Controls how package files are rendered. Loadable from TOML:
//!
//! ```toml
//! indent = 4
//! write_header = false
//! float_precision = 6
//! ```

use crate::models::GridKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Rendering and default settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Spaces in front of every line inside a block
    pub indent: usize,

    /// Write a `# File generated by ...` comment at the top of each file
    pub write_header: bool,

    /// Digits after the decimal point in scientific notation
    /// (None = shortest representation that reads back exactly)
    pub float_precision: Option<usize>,

    /// Number of values per line for internal array data
    pub values_per_line: usize,

    /// Grid kind assumed for new models
    pub default_grid: GridKind,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            write_header: true,
            float_precision: None,
            values_per_line: 10,
            default_grid: GridKind::Structured,
        }
    }
}

impl SdkConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> SdkConfigBuilder {
        SdkConfigBuilder::default()
    }

    /// Parse a configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::Io(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub(crate) fn indent_str(&self) -> String {
        " ".repeat(self.indent)
    }
}

/// Builder for SdkConfig
#[derive(Debug, Default)]
pub struct SdkConfigBuilder {
    config: SdkConfig,
}

impl SdkConfigBuilder {
    pub fn indent(mut self, indent: usize) -> Self {
        self.config.indent = indent;
        self
    }

    pub fn write_header(mut self, write: bool) -> Self {
        self.config.write_header = write;
        self
    }

    /// Set a fixed number of significant decimals for doubles
    pub fn float_precision(mut self, precision: usize) -> Self {
        self.config.float_precision = Some(precision.min(17));
        self
    }

    /// Set the array values per line (at least 1)
    pub fn values_per_line(mut self, count: usize) -> Self {
        self.config.values_per_line = count.max(1);
        self
    }

    pub fn default_grid(mut self, grid: GridKind) -> Self {
        self.config.default_grid = grid;
        self
    }

    /// Build the configuration
    pub fn build(self) -> SdkConfig {
        self.config
    }
}
