//! # Price Math
//!
//! Numeric building blocks for monthly commodity price series.
//! This crate provides the summary statistics, differencing helpers and the
//! derivative-free optimizer used by the forecasting crate.

use thiserror::Error;

pub mod differencing;
pub mod optimization;
pub mod stats;

/// Errors that can occur in price calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for price math operations
pub type Result<T> = std::result::Result<T, MathError>;
