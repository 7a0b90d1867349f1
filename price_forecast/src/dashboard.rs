//! Per-entity dashboard views
//!
//! A [`Dashboard`] answers one request at a time: it looks up the series,
//! checks the request against the configured bounds and runs the forecast.
//! Forecast failures that only concern the request leave the history usable,
//! so the view carries the failure instead of an error.

use crate::config::DashboardConfig;
use crate::error::{ForecastError, Result};
use crate::models::{fit_and_forecast_with, ForecastRequest, ForecastResult, ModelOrder};
use crate::overview::{self, PriceRanking};
use crate::series::{Series, SeriesCatalog};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared series catalog plus the configuration that bounds requests
#[derive(Debug, Clone)]
pub struct Dashboard {
    catalog: Arc<SeriesCatalog>,
    config: DashboardConfig,
}

/// History of one entity with its forecast, when one could be made
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub series: Series,
    pub request: ForecastRequest,
    pub forecast: Option<ForecastResult>,
    /// Why no forecast is shown
    pub forecast_failure: Option<String>,
}

impl EntityView {
    /// Percent change of the first forecast month over the latest price
    pub fn next_period_change(&self) -> Option<f64> {
        self.forecast
            .as_ref()?
            .next_period_change(self.series.summary().latest_price)
    }

    /// True when the forecast failed and only history is available
    pub fn is_degraded(&self) -> bool {
        self.forecast.is_none()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Dashboard {
    pub fn new(catalog: Arc<SeriesCatalog>, config: DashboardConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &SeriesCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Entity labels in sorted order
    pub fn entities(&self) -> Vec<&str> {
        self.catalog.labels()
    }

    /// Look up a series by label, ignoring case
    pub fn series(&self, entity: &str) -> Result<&Series> {
        self.catalog
            .get(entity)
            .ok_or_else(|| ForecastError::UnknownEntity(entity.to_string()))
    }

    /// History and forecast for one entity.
    ///
    /// Fails only for an unknown entity or parameters outside the configured
    /// bounds.
    pub fn analyze(&self, entity: &str, horizon: usize, order: ModelOrder) -> Result<EntityView> {
        let series = self.series(entity)?;
        self.config.bounds.check(horizon, order)?;

        let request = self.config.request(horizon, order);
        let (forecast, forecast_failure) =
            match fit_and_forecast_with(series, &request, &self.config.fit_options()) {
                Ok(result) => {
                    info!(entity = series.label(), model = %order, horizon, "forecast ready");
                    (Some(result), None)
                }
                Err(err) if err.is_request_scoped() => {
                    warn!(entity = series.label(), model = %order, error = %err, "showing history without forecast");
                    (None, Some(err.to_string()))
                }
                Err(err) => return Err(err),
            };

        Ok(EntityView {
            series: series.clone(),
            request,
            forecast,
            forecast_failure,
        })
    }

    /// [`Dashboard::analyze`] with the configured horizon and order
    pub fn analyze_default(&self, entity: &str) -> Result<EntityView> {
        let forecast = &self.config.forecast;
        self.analyze(entity, forecast.horizon, forecast.order)
    }

    /// Highest latest prices, limited to the configured count
    pub fn highest_priced(&self) -> Vec<PriceRanking> {
        overview::highest_priced(&self.catalog, self.config.overview.top_n)
    }

    /// Largest last-month moves, limited to the configured count
    pub fn most_volatile(&self) -> Vec<PriceRanking> {
        overview::most_volatile(&self.catalog, self.config.overview.top_n)
    }
}
