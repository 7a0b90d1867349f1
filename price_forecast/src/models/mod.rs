//! Forecasting models for monthly price series

use crate::error::{ForecastError, Result};
use crate::series::Series;
use crate::utils::round2;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::time::Duration;

pub mod arima;

pub use arima::{ArimaModel, TrainedArimaModel};

/// Fewest points a series needs before a model is fitted
pub const MIN_SERIES_POINTS: usize = 6;

/// Confidence level used when none is given
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// ARIMA model order
///
/// Missing components deserialize to those of the default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOrder {
    /// Autoregressive terms
    pub p: usize,
    /// Differencing rounds
    pub d: usize,
    /// Moving-average terms
    pub q: usize,
}

impl ModelOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ModelOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// What to forecast for one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Number of future months
    pub horizon: usize,
    /// Model order
    pub order: ModelOrder,
    /// Interval coverage in (0, 1)
    pub confidence: f64,
}

impl ForecastRequest {
    /// Request at the default 95% confidence
    pub fn new(horizon: usize, order: ModelOrder) -> Self {
        Self {
            horizon,
            order,
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be between 0 and 1, got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Optimizer settings for model fitting
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Iteration budget for the likelihood search
    pub max_iterations: usize,
    /// Relative convergence tolerance
    pub tolerance: f64,
    /// Wall-clock limit for the fit
    pub timeout: Option<Duration>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            tolerance: 1e-9,
            timeout: None,
        }
    }
}

/// A forecast month with its interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// First day of the forecast month
    pub date: NaiveDate,
    /// Point estimate
    pub point: f64,
    /// Lower interval bound
    pub lower: f64,
    /// Upper interval bound
    pub upper: f64,
}

impl ForecastPoint {
    /// Interval width
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Same point with every value rounded to two decimals
    pub fn rounded(&self) -> Self {
        Self {
            date: self.date,
            point: round2(self.point),
            lower: round2(self.lower),
            upper: round2(self.upper),
        }
    }
}

/// Goodness-of-fit figures for a fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Conditional Gaussian log-likelihood
    pub log_likelihood: f64,
    /// Akaike information criterion, `-2 ll + 2k`
    pub aic: f64,
    /// Bayesian information criterion, `-2 ll + k ln(n)`
    pub bic: f64,
    /// Free parameters `k`, innovation variance included
    pub parameters: usize,
    /// Observations entering the likelihood `n`
    pub observations: usize,
    /// Innovation variance
    pub sigma2: f64,
    /// Fitted AR coefficients
    pub ar: Vec<f64>,
    /// Fitted MA coefficients
    pub ma: Vec<f64>,
    /// Process mean, estimated only without differencing
    pub intercept: Option<f64>,
    /// Optimizer iterations used
    pub iterations: usize,
}

/// Forecast for one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    order: ModelOrder,
    confidence: f64,
    points: Vec<ForecastPoint>,
    diagnostics: FitDiagnostics,
}

impl ForecastResult {
    /// Create a forecast result; `points` must match the horizon
    pub fn new(
        order: ModelOrder,
        confidence: f64,
        horizon: usize,
        points: Vec<ForecastPoint>,
        diagnostics: FitDiagnostics,
    ) -> Result<Self> {
        if points.len() != horizon {
            return Err(ForecastError::InvalidParameter(format!(
                "Points length ({}) doesn't match horizon ({})",
                points.len(),
                horizon
            )));
        }

        Ok(Self {
            order,
            confidence,
            points,
            diagnostics,
        })
    }

    pub fn order(&self) -> ModelOrder {
        self.order
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Number of months forecast
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Point estimates
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point).collect()
    }

    /// (lower, upper) bounds
    pub fn intervals(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.lower, p.upper)).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    /// Percent change of the first forecast month over `latest_price`
    pub fn next_period_change(&self, latest_price: f64) -> Option<f64> {
        let first = self.points.first()?;
        price_math::stats::percent_change(latest_price, first.point).ok()
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Forecast `horizon` months after the training series
    fn forecast(&self, horizon: usize, confidence: f64) -> Result<ForecastResult>;

    /// Fit diagnostics
    fn diagnostics(&self) -> &FitDiagnostics;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a price series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a series
    fn train(&self, series: &Series, options: &FitOptions) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Fit an ARIMA model of the requested order and forecast with default options
pub fn fit_and_forecast(series: &Series, request: &ForecastRequest) -> Result<ForecastResult> {
    fit_and_forecast_with(series, request, &FitOptions::default())
}

/// Fit an ARIMA model of the requested order and forecast.
///
/// Series shorter than [`MIN_SERIES_POINTS`] fail with
/// [`ForecastError::InsufficientData`] before any fitting happens.
pub fn fit_and_forecast_with(
    series: &Series,
    request: &ForecastRequest,
    options: &FitOptions,
) -> Result<ForecastResult> {
    request.validate()?;
    if series.len() < MIN_SERIES_POINTS {
        return Err(ForecastError::InsufficientData {
            entity: series.label().to_string(),
            points: series.len(),
            required: MIN_SERIES_POINTS,
        });
    }

    let trained = ArimaModel::new(request.order).train(series, options)?;
    trained.forecast(request.horizon, request.confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostics() -> FitDiagnostics {
        FitDiagnostics {
            log_likelihood: -10.0,
            aic: 26.0,
            bic: 27.0,
            parameters: 3,
            observations: 10,
            sigma2: 1.0,
            ar: vec![0.5],
            ma: vec![],
            intercept: None,
            iterations: 12,
        }
    }

    #[test]
    fn test_order_display() {
        assert_eq!(ModelOrder::new(2, 0, 3).to_string(), "ARIMA(2,0,3)");
        assert_eq!(ModelOrder::default(), ModelOrder::new(1, 1, 1));
    }

    #[test]
    fn test_result_length_must_match_horizon() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let point = ForecastPoint {
            date,
            point: 100.0,
            lower: 90.0,
            upper: 110.0,
        };
        assert!(ForecastResult::new(ModelOrder::default(), 0.95, 2, vec![point], diagnostics()).is_err());

        let result = ForecastResult::new(ModelOrder::default(), 0.95, 1, vec![point], diagnostics()).unwrap();
        assert_eq!(result.horizon(), 1);
        assert_eq!(result.values(), vec![100.0]);
        assert_eq!(result.intervals(), vec![(90.0, 110.0)]);
        assert_eq!(result.next_period_change(80.0), Some(25.0));
        assert!(result.to_json().unwrap().contains("\"log_likelihood\""));
    }

    #[test]
    fn test_request_validation() {
        assert!(ForecastRequest::new(0, ModelOrder::default()).validate().is_err());
        assert!(ForecastRequest::new(3, ModelOrder::default())
            .with_confidence(1.0)
            .validate()
            .is_err());
        assert!(ForecastRequest::new(3, ModelOrder::default()).validate().is_ok());
    }
}
