//! Configuration for the layout engine

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::LayoutError;

/// Errors that can occur when loading a layout configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read layout config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse layout config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] LayoutError),
}

/// Tunables for branch placement and overlap resolution.
///
/// Every field is independently overridable; a TOML file only needs to name
/// the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal spacing reserved for a branch lane
    pub horizontal_spacing: f64,

    /// Vertical distance between a node and the next one appended below it
    pub vertical_spacing: f64,

    /// Default lateral offset of a two-way branch from its conditional node
    pub branch_offset: f64,

    /// Uniform node footprint width used for all overlap math
    pub node_width: f64,

    /// Minimum empty space between any two branch footprints
    pub min_branch_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 250.0,
            vertical_spacing: 350.0,
            branch_offset: 150.0,
            node_width: 200.0,
            min_branch_gap: 100.0,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load and validate a configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every tunable is a finite, non-negative number and that
    /// nodes have a footprint at all.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let fields = [
            ("horizontal_spacing", self.horizontal_spacing),
            ("vertical_spacing", self.vertical_spacing),
            ("branch_offset", self.branch_offset),
            ("node_width", self.node_width),
            ("min_branch_gap", self.min_branch_gap),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(LayoutError::invalid_config(field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(LayoutError::invalid_config(field, "must not be negative"));
            }
        }
        if self.node_width == 0.0 {
            return Err(LayoutError::invalid_config(
                "node_width",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn with_horizontal_spacing(mut self, spacing: f64) -> Self {
        self.horizontal_spacing = spacing;
        self
    }

    pub fn with_vertical_spacing(mut self, spacing: f64) -> Self {
        self.vertical_spacing = spacing;
        self
    }

    pub fn with_branch_offset(mut self, offset: f64) -> Self {
        self.branch_offset = offset;
        self
    }

    pub fn with_node_width(mut self, width: f64) -> Self {
        self.node_width = width;
        self
    }

    pub fn with_min_branch_gap(mut self, gap: f64) -> Self {
        self.min_branch_gap = gap;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.horizontal_spacing, 250.0);
        assert_eq!(config.vertical_spacing, 350.0);
        assert_eq!(config.branch_offset, 150.0);
        assert_eq!(config.node_width, 200.0);
        assert_eq!(config.min_branch_gap, 100.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_node_width(120.0)
            .with_min_branch_gap(40.0);

        assert_eq!(config.node_width, 120.0);
        assert_eq!(config.min_branch_gap, 40.0);
        assert_eq!(config.branch_offset, 150.0);
    }

    #[test]
    fn test_partial_toml_override() {
        let config = LayoutConfig::from_str("node_width = 180\nmin_branch_gap = 60.5\n")
            .expect("Should parse");
        assert_eq!(config.node_width, 180.0);
        assert_eq!(config.min_branch_gap, 60.5);
        assert_eq!(config.vertical_spacing, 350.0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = LayoutConfig::from_str("").expect("Should parse");
        assert_eq!(config, LayoutConfig::default());
    }

    #[test]
    fn test_negative_value_rejected() {
        let result = LayoutConfig::from_str("branch_offset = -5.0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_node_width_rejected() {
        let err = LayoutConfig::new().with_node_width(0.0).validate().unwrap_err();
        assert!(err.to_string().contains("node_width"));
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = LayoutConfig::from_str("this is not valid toml {{{{");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
