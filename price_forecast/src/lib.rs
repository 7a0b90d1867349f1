//! # Price Forecast
//!
//! Monthly crop price history and ARIMA forecasting.
//!
//! ## Features
//!
//! - Loading and validating price tables (CSV, embedded dataset)
//! - Per-crop monthly series with summary figures
//! - ARIMA(p,d,q) forecasts with confidence intervals and AIC/BIC
//! - CSV and JSON export
//! - A process-wide catalog cache keyed by table content
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use price_forecast::data::DataLoader;
//! use price_forecast::models::{fit_and_forecast, ForecastRequest, ModelOrder};
//! use price_forecast::series::SeriesBuilder;
//!
//! let store = DataLoader::embedded()?;
//! let catalog = SeriesBuilder::build(&store)?;
//! let cotton = catalog.get("Cotton").expect("embedded dataset has cotton");
//!
//! let result = fit_and_forecast(cotton, &ForecastRequest::new(6, ModelOrder::new(1, 1, 1)))?;
//! for point in result.points() {
//!     println!("{}: {:.2} [{:.2}, {:.2}]", point.date, point.point, point.lower, point.upper);
//! }
//! # Ok::<(), price_forecast::error::ForecastError>(())
//! ```

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod export;
pub mod models;
pub mod overview;
pub mod series;
pub mod utils;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, EntityView};
pub use data::{DataLoader, Observation, RecordStore};
pub use error::{ForecastError, Result};
pub use models::{
    fit_and_forecast, fit_and_forecast_with, FitDiagnostics, FitOptions, ForecastPoint,
    ForecastRequest, ForecastResult, ModelOrder,
};
pub use series::{Series, SeriesBuilder, SeriesCatalog};
