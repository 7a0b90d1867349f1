//! Summary statistics for price series
//!
//! Contains the descriptive measures shown for every crop series:
//! - Mean, minimum and maximum
//! - Sample variance
//! - Period-over-period percent change
//! - Standard normal quantiles for interval construction

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty series".to_string(),
        ));
    }
    Ok(values.iter().mean())
}

/// Sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Variance needs at least 2 values, have {}",
            values.len()
        )));
    }
    Ok(values.iter().variance())
}

/// Smallest value in the series
pub fn min(values: &[f64]) -> Result<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::min)
        .ok_or_else(|| MathError::InsufficientData("Cannot take the minimum of an empty series".to_string()))
}

/// Largest value in the series
pub fn max(values: &[f64]) -> Result<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or_else(|| MathError::InsufficientData("Cannot take the maximum of an empty series".to_string()))
}

/// Percent change from `previous` to `current`
pub fn percent_change(previous: f64, current: f64) -> Result<f64> {
    if previous == 0.0 {
        return Err(MathError::CalculationError(
            "Percent change is undefined for a zero base value".to_string(),
        ));
    }
    Ok((current - previous) / previous * 100.0)
}

/// Percent change of the final value relative to its predecessor.
///
/// Returns 0 when the series has fewer than two values.
pub fn last_percent_change(values: &[f64]) -> Result<f64> {
    match values {
        [.., previous, current] => percent_change(*previous, *current),
        _ => Ok(0.0),
    }
}

/// Quantile of the standard normal distribution at probability `p`
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Probability must be in (0, 1), got {}",
            p
        )));
    }
    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Standard normal unavailable: {}", e)))?;
    Ok(standard.inverse_cdf(p))
}

/// Two-sided critical value for a symmetric interval at `level` confidence
pub fn two_sided_z(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be in (0, 1), got {}",
            level
        )));
    }
    normal_quantile(1.0 - (1.0 - level) / 2.0)
}
