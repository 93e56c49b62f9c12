//! Run configuration
//!
//! Defaults can be overridden through environment variables:
//!   FORECAST_TICKER, FORECAST_PERIOD, YEARS_FORECAST, DISCOUNT_RATE,
//!   WORKBOOK_DIR, HISTORY_DIR

use crate::error::{ModelError, Result};
use std::env;
use std::path::PathBuf;

/// Default forecast horizon in years (also the historical row limit)
pub const DEFAULT_YEARS_FORECAST: u32 = 5;

/// Fixed annual rate used to discount free cash flow (10%)
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.10;

/// Configuration for a model run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Ticker symbol of the company being forecast
    pub ticker: String,

    /// Filing period requested from the historical source
    pub period: String,

    /// Number of years to project
    pub years_forecast: u32,

    /// Annual discount rate for NPV of free cash flow
    pub discount_rate: f64,

    /// Directory holding the CSV workbook tabs
    pub workbook_dir: PathBuf,

    /// Directory holding historical statement JSON files
    pub history_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            period: "annual".to_string(),
            years_forecast: DEFAULT_YEARS_FORECAST,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            workbook_dir: PathBuf::from("data/workbook"),
            history_dir: PathBuf::from("data/history"),
        }
    }
}

impl ModelConfig {
    /// Build a config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ticker: env::var("FORECAST_TICKER").unwrap_or(defaults.ticker),
            period: env::var("FORECAST_PERIOD").unwrap_or(defaults.period),
            years_forecast: env::var("YEARS_FORECAST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.years_forecast),
            discount_rate: env::var("DISCOUNT_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.discount_rate),
            workbook_dir: env::var("WORKBOOK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.workbook_dir),
            history_dir: env::var("HISTORY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_dir),
        }
    }

    /// Check that the config can drive a projection
    pub fn validate(&self) -> Result<()> {
        if self.years_forecast == 0 {
            return Err(ModelError::InvalidConfig(
                "years_forecast must be at least 1".to_string(),
            ));
        }
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return Err(ModelError::InvalidConfig(format!(
                "discount_rate {} must be finite and greater than -100%",
                self.discount_rate
            )));
        }
        if self.ticker.trim().is_empty() {
            return Err(ModelError::InvalidConfig("ticker is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.years_forecast, 5);
        assert!((config.discount_rate - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let config = ModelConfig {
            years_forecast: 0,
            ..ModelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_finite_discount_rate_rejected() {
        for rate in [f64::NAN, f64::INFINITY, -1.0] {
            let config = ModelConfig {
                discount_rate: rate,
                ..ModelConfig::default()
            };
            assert!(config.validate().is_err(), "accepted {}", rate);
        }
    }
}
