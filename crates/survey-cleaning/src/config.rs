//! Configuration types for a cleaning run.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How replacement values are drawn for missing cells of a categorical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalDraw {
    /// Draw independently for every missing cell
    #[default]
    PerCell,
    /// Draw once per column and reuse that category for every missing cell
    SharedBatch,
}

/// Configuration for a cleaning run.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use survey_cleaning::config::{CleaningConfig, CategoricalDraw};
///
/// let config = CleaningConfig::builder()
///     .seed(42)
///     .categorical_draw(CategoricalDraw::SharedBatch)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Seed for the random source. `None` seeds from OS entropy.
    /// Default: None
    pub seed: Option<u64>,

    /// Batching policy for categorical draws.
    /// Default: PerCell
    pub categorical_draw: CategoricalDraw,

    /// Category used when a categorical column has no parseable value.
    /// Default: 0
    pub fallback_category: i64,

    /// Field separator for reading and writing CSV files.
    /// Default: b','
    pub csv_separator: u8,

    /// Where to write the JSON run summary, if anywhere.
    /// Default: None
    pub summary_path: Option<PathBuf>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            seed: None,
            categorical_draw: CategoricalDraw::default(),
            fallback_category: 0,
            csv_separator: b',',
            summary_path: None,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Load a configuration from a JSON file.
    ///
    /// Fields not present in the file keep their defaults.
    pub fn from_json_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CleaningConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| crate::error::CleaningError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let sep = self.csv_separator;
        if !sep.is_ascii() || matches!(sep, b'"' | b'\n' | b'\r') {
            return Err(ConfigValidationError::InvalidSeparator(sep));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid CSV separator byte {0:#04x} (must be ASCII and not a quote or newline)")]
    InvalidSeparator(u8),
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    seed: Option<u64>,
    categorical_draw: Option<CategoricalDraw>,
    fallback_category: Option<i64>,
    csv_separator: Option<u8>,
    summary_path: Option<PathBuf>,
}

impl CleaningConfigBuilder {
    /// Start from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: CleaningConfig) -> Self {
        Self {
            seed: config.seed,
            categorical_draw: Some(config.categorical_draw),
            fallback_category: Some(config.fallback_category),
            csv_separator: Some(config.csv_separator),
            summary_path: config.summary_path,
        }
    }

    /// Seed the random source for reproducible output.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the batching policy for categorical draws.
    pub fn categorical_draw(mut self, draw: CategoricalDraw) -> Self {
        self.categorical_draw = Some(draw);
        self
    }

    /// Set the category imputed into categorical columns with no parseable value.
    pub fn fallback_category(mut self, category: i64) -> Self {
        self.fallback_category = Some(category);
        self
    }

    /// Set the CSV field separator.
    pub fn csv_separator(mut self, separator: u8) -> Self {
        self.csv_separator = Some(separator);
        self
    }

    /// Write a JSON summary of the run to this path.
    pub fn summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            seed: self.seed,
            categorical_draw: self.categorical_draw.unwrap_or_default(),
            fallback_category: self.fallback_category.unwrap_or(0),
            csv_separator: self.csv_separator.unwrap_or(b','),
            summary_path: self.summary_path,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleaningConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.categorical_draw, CategoricalDraw::PerCell);
        assert_eq!(config.fallback_category, 0);
        assert_eq!(config.csv_separator, b',');
        assert!(config.summary_path.is_none());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = CleaningConfig::builder()
            .seed(99)
            .categorical_draw(CategoricalDraw::SharedBatch)
            .fallback_category(-1)
            .csv_separator(b';')
            .summary_path("out/summary.json")
            .build()
            .unwrap();

        assert_eq!(config.seed, Some(99));
        assert_eq!(config.categorical_draw, CategoricalDraw::SharedBatch);
        assert_eq!(config.fallback_category, -1);
        assert_eq!(config.csv_separator, b';');
        assert_eq!(
            config.summary_path.as_deref(),
            Some(std::path::Path::new("out/summary.json"))
        );
    }

    #[test]
    fn test_validation_invalid_separator() {
        let result = CleaningConfig::builder().csv_separator(b'"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSeparator(b'"')
        ));

        assert!(CleaningConfig::builder().csv_separator(0xE9).build().is_err());
    }

    #[test]
    fn test_builder_from_config_preserves_values() {
        let base = CleaningConfig::builder().seed(3).build().unwrap();
        let config = CleaningConfigBuilder::from_config(base)
            .fallback_category(9)
            .build()
            .unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.fallback_category, 9);
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "seed": 2024,
            "categorical_draw": "shared_batch"
        }"#;

        let config: CleaningConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, Some(2024));
        assert_eq!(config.categorical_draw, CategoricalDraw::SharedBatch);
        assert_eq!(config.fallback_category, 0);
        assert_eq!(config.csv_separator, b',');
    }
}
