//! Dashboard configuration
//!
//! Settings come from an optional TOML file, then environment variables
//! prefixed with `CROP_PRICES_` using `__` between nested keys, e.g.
//! `CROP_PRICES_FORECAST__HORIZON=9`. Every field has a default, so an empty
//! configuration is valid.

use crate::error::{ForecastError, Result};
use crate::models::{FitOptions, ForecastRequest, ModelOrder, DEFAULT_CONFIDENCE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "CROP_PRICES";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataSettings,
    pub forecast: ForecastSettings,
    pub bounds: ParameterBounds,
    pub overview: OverviewSettings,
}

/// Where prices are read from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// CSV file to load; the embedded dataset when unset
    pub path: Option<PathBuf>,
}

/// Defaults for forecast requests and the fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub horizon: usize,
    pub order: ModelOrder,
    pub confidence: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Fit time limit in milliseconds
    pub timeout_ms: Option<u64>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            horizon: 6,
            order: ModelOrder::default(),
            confidence: DEFAULT_CONFIDENCE,
            max_iterations: fit.max_iterations,
            tolerance: fit.tolerance,
            timeout_ms: None,
        }
    }
}

/// Limits on what a caller may request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterBounds {
    pub max_horizon: usize,
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            max_horizon: 12,
            max_p: 3,
            max_d: 2,
            max_q: 3,
        }
    }
}

impl ParameterBounds {
    /// Reject a horizon or order outside the configured limits
    pub fn check(&self, horizon: usize, order: ModelOrder) -> Result<()> {
        if horizon == 0 || horizon > self.max_horizon {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon must be between 1 and {}, got {}",
                self.max_horizon, horizon
            )));
        }
        if order.p > self.max_p || order.d > self.max_d || order.q > self.max_q {
            return Err(ForecastError::InvalidParameter(format!(
                "{} exceeds the limits p <= {}, d <= {}, q <= {}",
                order, self.max_p, self.max_d, self.max_q
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewSettings {
    /// Entries shown in each ranking
    pub top_n: usize,
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

impl DashboardConfig {
    /// Load from an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check that the defaults satisfy the configured bounds
    pub fn validate(&self) -> Result<()> {
        let forecast = &self.forecast;
        self.bounds
            .check(forecast.horizon, forecast.order)
            .map_err(|e| ForecastError::ConfigError(format!("forecast defaults: {}", e)))?;
        if !(forecast.confidence > 0.0 && forecast.confidence < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "confidence must be between 0 and 1, got {}",
                forecast.confidence
            )));
        }
        if forecast.max_iterations == 0 {
            return Err(ForecastError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(forecast.tolerance > 0.0) {
            return Err(ForecastError::ConfigError(format!(
                "tolerance must be positive, got {}",
                forecast.tolerance
            )));
        }
        Ok(())
    }

    /// Optimizer settings derived from the forecast section
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            max_iterations: self.forecast.max_iterations,
            tolerance: self.forecast.tolerance,
            timeout: self.forecast.timeout_ms.map(Duration::from_millis),
        }
    }

    /// Request for `horizon` months of `order` at the configured confidence
    pub fn request(&self, horizon: usize, order: ModelOrder) -> ForecastRequest {
        ForecastRequest::new(horizon, order).with_confidence(self.forecast.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.forecast.horizon, 6);
        assert_eq!(config.forecast.order, ModelOrder::new(1, 1, 1));
        assert_eq!(config.bounds.max_horizon, 12);
        assert_eq!(config.overview.top_n, 5);
        assert!(config.validate().is_ok());
        assert_eq!(config.fit_options(), FitOptions::default());
    }

    #[test]
    fn test_bounds_check() {
        let bounds = ParameterBounds::default();
        assert!(bounds.check(12, ModelOrder::new(3, 2, 3)).is_ok());
        assert!(bounds.check(0, ModelOrder::default()).is_err());
        assert!(bounds.check(13, ModelOrder::default()).is_err());
        assert!(bounds.check(6, ModelOrder::new(4, 1, 1)).is_err());
        assert!(bounds.check(6, ModelOrder::new(1, 3, 1)).is_err());
    }
}
