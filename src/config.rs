use crate::analytics::DEFAULT_HIGH_CONSUMPTION_THRESHOLD;
use crate::error::{Result as EngineResult, WattlyticsError};
use crate::projections::{DEFAULT_PREDICTION_MARGIN, DEFAULT_PREDICTION_WINDOW, Predictor};
use crate::tariff::Tariff;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration settings for Wattlytics
///
/// Stored as YAML, every field optional in the file:
/// - Slab tariff and fixed charge
/// - High-consumption threshold (fraction above the average)
/// - Prediction margin and window
/// - Default output format
/// - Export directory for CSV files
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Slab table, validated on load
    pub tariff: Tariff,
    /// Months above `avg * (1 + threshold)` are flagged
    pub high_consumption_threshold: f64,
    /// Best/worst case spread around the expected units
    pub prediction_margin: f64,
    /// Number of trailing months the prediction averages
    pub prediction_window: usize,
    /// Default output format for reports
    pub default_output_format: OutputFormat,
    /// Directory for CSV exports (default: current directory)
    pub export_directory: Option<PathBuf>,
}

/// Output format options for reports
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Cards and summaries (default)
    Enhanced,
    /// Plain tables
    Table,
    /// JSON for scripting
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tariff: Tariff::default(),
            high_consumption_threshold: DEFAULT_HIGH_CONSUMPTION_THRESHOLD,
            prediction_margin: DEFAULT_PREDICTION_MARGIN,
            prediction_window: DEFAULT_PREDICTION_WINDOW,
            default_output_format: OutputFormat::Enhanced,
            export_directory: None,
        }
    }
}

/// Session-start overrides, typically from the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `"100:3,200:4.5,*:8"` style slab table
    pub tariff_spec: Option<String>,
    pub fixed_charge: Option<f64>,
    pub high_consumption_threshold: Option<f64>,
    pub prediction_margin: Option<f64>,
}

impl Config {
    /// Missing file means defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(WattlyticsError::from)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).map_err(WattlyticsError::from)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine the user config directory"))?;
        Ok(base.join("wattlytics").join("config.yaml"))
    }

    pub fn get_export_directory(&self) -> PathBuf {
        self.export_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Check every setting that feeds a computation
    pub fn validate(&self) -> EngineResult<()> {
        let threshold = self.high_consumption_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(WattlyticsError::config_error(&format!(
                "high consumption threshold must be a non-negative fraction, got {}",
                threshold
            )));
        }
        self.predictor()?;
        Ok(())
    }

    pub fn predictor(&self) -> EngineResult<Predictor> {
        Predictor::new(self.prediction_window, self.prediction_margin)
    }

    /// Apply overrides and re-validate; `self` is untouched on error
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> EngineResult<Config> {
        let mut config = self.clone();
        let fixed_charge = overrides
            .fixed_charge
            .unwrap_or_else(|| config.tariff.fixed_charge());

        config.tariff = match &overrides.tariff_spec {
            Some(spec) => Tariff::parse_slab_spec(spec, fixed_charge)?,
            None => Tariff::new(config.tariff.slabs().to_vec(), fixed_charge)?,
        };
        if overrides.tariff_spec.is_some() || overrides.fixed_charge.is_some() {
            tracing::info!(
                slabs = config.tariff.slabs().len(),
                fixed_charge = config.tariff.fixed_charge(),
                "tariff overridden"
            );
        }

        if let Some(threshold) = overrides.high_consumption_threshold {
            config.high_consumption_threshold = threshold;
        }
        if let Some(margin) = overrides.prediction_margin {
            config.prediction_margin = margin;
        }

        config.validate()?;
        Ok(config)
    }
}
