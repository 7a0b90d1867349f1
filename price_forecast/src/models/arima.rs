//! ARIMA models for monthly price forecasting
//!
//! Parameters are estimated by conditional maximum likelihood: the innovation
//! variance is concentrated out, so the search minimizes the conditional sum
//! of squared one-step errors of the differenced series. The search runs on a
//! standardized copy of the series so that one set of optimizer tolerances
//! suits prices of any magnitude.

use crate::error::{ForecastError, Result};
use crate::models::{
    FitDiagnostics, FitOptions, ForecastModel, ForecastPoint, ForecastResult, ModelOrder,
    TrainedForecastModel, MIN_SERIES_POINTS,
};
use crate::series::Series;
use crate::utils::month_sequence;
use chrono::NaiveDate;
use price_math::differencing::{
    difference, difference_polynomial, integrate, is_constant, multiply_polynomials,
};
use price_math::optimization::{nelder_mead, NelderMeadConfig, Termination};
use price_math::stats;
use std::f64::consts::PI;
use std::time::Instant;
use tracing::debug;

/// Largest magnitude allowed for an AR or MA coefficient
const COEFFICIENT_BOUND: f64 = 0.99;

/// Largest intercept offset, in standard deviations of the differenced series
const INTERCEPT_BOUND: f64 = 5.0;

/// Differenced series with a spread below this are treated as constant
const MIN_SCALE: f64 = 1e-10;

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    order: ModelOrder,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Name of the model
    name: String,
    order: ModelOrder,
    /// Observed prices
    history: Vec<f64>,
    /// Prices after `d` rounds of differencing
    differenced: Vec<f64>,
    /// One-step errors on the differenced scale
    residuals: Vec<f64>,
    /// Mean of the differenced series, zero when `d > 0`
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    last_date: NaiveDate,
    diagnostics: FitDiagnostics,
}

/// Free parameters unpacked from an optimizer point, in standardized units
struct Parameters<'a> {
    ar: &'a [f64],
    ma: &'a [f64],
    intercept: f64,
}

impl<'a> Parameters<'a> {
    fn unpack(point: &'a [f64], order: ModelOrder, with_intercept: bool) -> Self {
        let (ar, rest) = point.split_at(order.p);
        let (ma, rest) = rest.split_at(order.q);
        let intercept = if with_intercept {
            rest.first().copied().unwrap_or(0.0)
        } else {
            0.0
        };
        Self { ar, ma, intercept }
    }
}

/// One-step errors of an ARMA recursion; the first `p` errors are zero
fn arma_residuals(z: &[f64], params: &Parameters<'_>) -> Vec<f64> {
    let p = params.ar.len();
    let mut errors = vec![0.0; z.len()];
    for t in p..z.len() {
        let mut predicted = params.intercept;
        for (i, phi) in params.ar.iter().enumerate() {
            predicted += phi * (z[t - 1 - i] - params.intercept);
        }
        for (j, theta) in params.ma.iter().enumerate() {
            if t > j {
                predicted += theta * errors[t - 1 - j];
            }
        }
        errors[t] = z[t] - predicted;
    }
    errors
}

fn conditional_sum_of_squares(z: &[f64], params: &Parameters<'_>) -> f64 {
    let p = params.ar.len();
    arma_residuals(z, params)[p..].iter().map(|e| e * e).sum()
}

/// Coefficients of the infinite MA representation of the integrated model.
///
/// `psi[0]` is one; the h-step forecast variance is `sigma2` times the sum of
/// the first `h` squared weights.
fn psi_weights(ar: &[f64], ma: &[f64], d: usize, count: usize) -> Vec<f64> {
    let mut ar_poly = Vec::with_capacity(ar.len() + 1);
    ar_poly.push(1.0);
    ar_poly.extend(ar.iter().map(|phi| -phi));
    let full = multiply_polynomials(&ar_poly, &difference_polynomial(d));

    let mut psi = vec![0.0; count];
    if count == 0 {
        return psi;
    }
    psi[0] = 1.0;
    for j in 1..count {
        let mut value = if j <= ma.len() { ma[j - 1] } else { 0.0 };
        for i in 1..full.len().min(j + 1) {
            value -= full[i] * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}

impl ArimaModel {
    /// Create a new ARIMA model of the given order
    pub fn new(order: ModelOrder) -> Self {
        Self {
            name: order.to_string(),
            order,
        }
    }

    pub fn order(&self) -> ModelOrder {
        self.order
    }

    fn invalid_order(&self, series_len: usize, reason: String) -> ForecastError {
        ForecastError::InvalidOrder {
            order: self.order,
            series_len,
            reason,
        }
    }

    fn non_convergence(&self, series_len: usize, reason: String) -> ForecastError {
        ForecastError::NonConvergence {
            order: self.order,
            series_len,
            reason,
        }
    }

    /// Train on raw prices ending at `last_date`
    pub fn train_values(
        &self,
        label: &str,
        values: &[f64],
        last_date: NaiveDate,
        options: &FitOptions,
    ) -> Result<TrainedArimaModel> {
        let ModelOrder { p, d, q } = self.order;
        let n = values.len();
        if n < MIN_SERIES_POINTS {
            return Err(ForecastError::InsufficientData {
                entity: label.to_string(),
                points: n,
                required: MIN_SERIES_POINTS,
            });
        }
        if d >= n {
            return Err(self.invalid_order(n, format!("cannot difference {} times", d)));
        }

        let with_intercept = d == 0;
        let free = p + q + usize::from(with_intercept);
        let differenced = difference(values, d);
        let effective = differenced.len().saturating_sub(p);
        if effective < free + 2 {
            return Err(self.invalid_order(
                n,
                format!(
                    "{} usable observations for {} coefficients, need at least {}",
                    effective,
                    free,
                    free + 2
                ),
            ));
        }

        let centre = if with_intercept {
            stats::mean(&differenced)?
        } else {
            0.0
        };
        let magnitude = differenced.iter().fold(1.0_f64, |m, w| m.max(w.abs()));
        if is_constant(&differenced, MIN_SCALE * magnitude) {
            return Err(self.non_convergence(n, "differenced series is constant".to_string()));
        }
        let scale = stats::variance(&differenced)?.sqrt();
        if !scale.is_finite() || scale <= MIN_SCALE * centre.abs().max(1.0) {
            return Err(self.non_convergence(n, "differenced series has no spread".to_string()));
        }
        let z: Vec<f64> = differenced.iter().map(|w| (w - centre) / scale).collect();

        let started = Instant::now();
        let (point, css, iterations) = if free == 0 {
            let params = Parameters::unpack(&[], self.order, false);
            (Vec::new(), conditional_sum_of_squares(&z, &params), 0)
        } else {
            let mut initial = Vec::with_capacity(free);
            initial.extend((0..p).map(|i| 0.1 / (i as f64 + 1.0)));
            initial.extend((0..q).map(|j| 0.1 / (j as f64 + 1.0)));
            let mut bounds = vec![(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); p + q];
            if with_intercept {
                initial.push(0.0);
                bounds.push((-INTERCEPT_BOUND, INTERCEPT_BOUND));
            }

            let config = NelderMeadConfig {
                max_iter: options.max_iterations,
                tolerance: options.tolerance,
                deadline: options.timeout.map(|limit| started + limit),
                ..NelderMeadConfig::default()
            };
            let order = self.order;
            let objective = |x: &[f64]| {
                let params = Parameters::unpack(x, order, with_intercept);
                conditional_sum_of_squares(&z, &params) / effective as f64
            };
            let result = nelder_mead(objective, &initial, Some(bounds.as_slice()), &config)?;

            match result.termination {
                Termination::Converged => {}
                Termination::MaxIterations => {
                    return Err(self.non_convergence(
                        n,
                        format!("no convergence after {} iterations", result.iterations),
                    ))
                }
                Termination::DeadlineExceeded => {
                    return Err(ForecastError::Timeout {
                        order: self.order,
                        series_len: n,
                        limit: options.timeout.unwrap_or_default(),
                    })
                }
            }
            (result.point, result.value * effective as f64, result.iterations)
        };

        let params = Parameters::unpack(&point, self.order, with_intercept);
        let sigma2 = css / effective as f64 * scale * scale;
        if !sigma2.is_finite() || sigma2 <= 0.0 {
            return Err(self.non_convergence(
                n,
                format!("innovation variance {} is not positive", sigma2),
            ));
        }

        let n_eff = effective as f64;
        let log_likelihood = -0.5 * n_eff * ((2.0 * PI * sigma2).ln() + 1.0);
        let parameters = free + 1;
        let k = parameters as f64;
        let intercept = centre + params.intercept * scale;
        let residuals: Vec<f64> = arma_residuals(&z, &params)
            .into_iter()
            .map(|e| e * scale)
            .collect();

        let diagnostics = FitDiagnostics {
            log_likelihood,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n_eff.ln(),
            parameters,
            observations: effective,
            sigma2,
            ar: params.ar.to_vec(),
            ma: params.ma.to_vec(),
            intercept: with_intercept.then_some(intercept),
            iterations,
        };

        debug!(
            entity = label,
            model = %self.order,
            iterations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            aic = diagnostics.aic,
            "fitted model"
        );

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            order: self.order,
            history: values.to_vec(),
            differenced,
            residuals,
            intercept: if with_intercept { intercept } else { 0.0 },
            ar: params.ar.to_vec(),
            ma: params.ma.to_vec(),
            sigma2,
            last_date,
            diagnostics,
        })
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, series: &Series, options: &FitOptions) -> Result<Self::Trained> {
        self.train_values(series.label(), &series.prices(), series.last_date(), options)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    pub fn order(&self) -> ModelOrder {
        self.order
    }

    /// Point forecasts on the original price scale
    pub fn predict(&self, horizon: usize) -> Vec<f64> {
        let mut extended: Vec<f64> = self.differenced.clone();
        let mut errors = self.residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut value = self.intercept;
            for (i, phi) in self.ar.iter().enumerate() {
                if t > i {
                    value += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (j, theta) in self.ma.iter().enumerate() {
                if t > j {
                    value += theta * errors[t - 1 - j];
                }
            }
            extended.push(value);
            // Future shocks have zero expectation
            errors.push(0.0);
        }

        let future = &extended[self.differenced.len()..];
        integrate(future, &self.history, self.order.d)
    }

    /// Forecast standard errors for steps `1..=horizon`, non-decreasing
    pub fn standard_errors(&self, horizon: usize) -> Vec<f64> {
        let psi = psi_weights(&self.ar, &self.ma, self.order.d, horizon);
        let mut cumulative = 0.0;
        psi.iter()
            .map(|w| {
                cumulative += w * w;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect()
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizon: usize, confidence: f64) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1".to_string(),
            ));
        }
        let z = stats::two_sided_z(confidence)?;
        let dates = month_sequence(self.last_date, horizon)?;
        let predictions = self.predict(horizon);
        let errors = self.standard_errors(horizon);

        let points = dates
            .into_iter()
            .zip(predictions)
            .zip(errors)
            .map(|((date, point), se)| ForecastPoint {
                date,
                point,
                lower: point - z * se,
                upper: point + z * se,
            })
            .collect();

        ForecastResult::new(self.order, confidence, horizon, points, self.diagnostics.clone())
    }

    fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    fn name(&self) -> &str {
        &self.name
    }
}
