//! Error types for the price_forecast crate

use crate::models::ModelOrder;
use price_math::MathError;
use std::time::Duration;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A row of the input table failed validation; aborts the whole load
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    /// The input table had a header but no data rows
    #[error("Dataset contains no records")]
    EmptyDataset,

    /// An entity ended up with no observations
    #[error("No observations for entity '{entity}'")]
    EmptyPartition { entity: String },

    /// Too few points to fit a model
    #[error("Insufficient data for {entity}: {points} points, need at least {required}")]
    InsufficientData {
        entity: String,
        points: usize,
        required: usize,
    },

    /// The order cannot be estimated from a series of this length
    #[error("Invalid order {order} for a series of {series_len} points: {reason}")]
    InvalidOrder {
        order: ModelOrder,
        series_len: usize,
        reason: String,
    },

    /// Maximum-likelihood estimation failed
    #[error("{order} did not converge on a series of {series_len} points: {reason}")]
    NonConvergence {
        order: ModelOrder,
        series_len: usize,
        reason: String,
    },

    /// The caller's fit deadline passed
    #[error("Fitting {order} on a series of {series_len} points exceeded the {limit:?} limit")]
    Timeout {
        order: ModelOrder,
        series_len: usize,
        limit: Duration,
    },

    /// The requested entity is not in the catalog
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Error from loading configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

impl ForecastError {
    /// Whether the error only affects a single forecast request.
    ///
    /// Request-scoped failures leave the historical series usable, so callers
    /// fall back to showing history without a forecast.
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. }
                | ForecastError::InvalidOrder { .. }
                | ForecastError::NonConvergence { .. }
                | ForecastError::Timeout { .. }
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::JsonError(err.to_string())
    }
}

impl From<config::ConfigError> for ForecastError {
    fn from(err: config::ConfigError) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
