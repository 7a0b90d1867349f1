//! # Crop Prices
//!
//! `crop_prices` bundles the workspace crates behind one dependency:
//! [`forecast`] for loading, series building and ARIMA forecasts, and
//! [`math`] for the numeric routines underneath.
//!
//! ## Example
//!
//! ```
//! use crop_prices::forecast::{cache, Dashboard, DashboardConfig, DataLoader};
//!
//! let store = DataLoader::embedded()?;
//! let dashboard = Dashboard::new(cache::catalog_for(&store)?, DashboardConfig::default());
//! assert_eq!(dashboard.entities().len(), 12);
//!
//! let view = dashboard.analyze_default("cotton")?;
//! assert_eq!(view.series.len(), 60);
//! # Ok::<(), crop_prices::forecast::ForecastError>(())
//! ```

pub use price_forecast as forecast;
pub use price_math as math;
