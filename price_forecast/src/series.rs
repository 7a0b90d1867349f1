//! Per-entity monthly price series
//!
//! [`SeriesBuilder`] partitions a [`RecordStore`] by case-folded entity label,
//! orders each partition by month and precomputes the summary figures shown
//! next to every chart.

use crate::data::{entity_key, RecordStore};
use crate::error::{ForecastError, Result};
use crate::utils::format_short_month;
use chrono::NaiveDate;
use price_math::stats;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A single month of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// First day of the month
    pub date: NaiveDate,
    /// Price for the month
    pub price: f64,
}

/// Derived figures for a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of points
    pub count: usize,
    /// First month
    pub first: NaiveDate,
    /// Last month
    pub last: NaiveDate,
    /// Price at the last month
    pub latest_price: f64,
    /// Mean price
    pub mean_price: f64,
    /// Lowest price
    pub min_price: f64,
    /// Highest price
    pub max_price: f64,
    /// Percent change of the last price over the one before it, 0 for a single point
    pub last_change_pct: f64,
}

impl SeriesSummary {
    fn from_points(points: &[SeriesPoint]) -> Result<Self> {
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(ForecastError::InvalidParameter(
                    "Cannot summarize an empty series".to_string(),
                ))
            }
        };
        let prices: Vec<f64> = points.iter().map(|p| p.price).collect();

        Ok(Self {
            count: points.len(),
            first: first.date,
            last: last.date,
            latest_price: last.price,
            mean_price: stats::mean(&prices)?,
            min_price: stats::min(&prices)?,
            max_price: stats::max(&prices)?,
            last_change_pct: stats::last_percent_change(&prices)?,
        })
    }

    /// "Jan 2020 to Dec 2024"
    pub fn date_range(&self) -> String {
        format!(
            "{} to {}",
            format_short_month(self.first),
            format_short_month(self.last)
        )
    }
}

/// One entity's chronologically ordered prices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    label: String,
    key: String,
    points: Vec<SeriesPoint>,
    regions: Vec<String>,
    summary: SeriesSummary,
}

impl Series {
    /// Build a series from unordered points.
    ///
    /// Points are sorted by month; two points in the same month are rejected.
    pub fn new(label: &str, points: Vec<SeriesPoint>) -> Result<Self> {
        Self::with_regions(label, points, Vec::new())
    }

    /// Build a series that also records the regions its prices came from
    pub fn with_regions(label: &str, mut points: Vec<SeriesPoint>, regions: Vec<String>) -> Result<Self> {
        let key = entity_key(label);
        if points.is_empty() {
            return Err(ForecastError::EmptyPartition { entity: key });
        }

        points.sort_by_key(|p| p.date);
        if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ForecastError::InvalidParameter(format!(
                "Series '{}' has two prices for {}",
                label, pair[0].date
            )));
        }

        let summary = SeriesSummary::from_points(&points)?;
        Ok(Self {
            label: title_case(&key),
            key,
            points,
            regions,
            summary,
        })
    }

    /// Display label, e.g. "Cotton"
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Case-folded label, e.g. "cotton"
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Points in ascending month order
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Prices in ascending month order
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Months in ascending order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Regions contributing to this series, sorted
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn summary(&self) -> &SeriesSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a series holds at least one point
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last month in the series
    pub fn last_date(&self) -> NaiveDate {
        self.summary.last
    }
}

/// All series built from one record store
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesCatalog {
    series: BTreeMap<String, Series>,
    fingerprint: u64,
}

impl SeriesCatalog {
    /// Look up a series by label, ignoring case and surrounding spaces
    pub fn get(&self, entity: &str) -> Option<&Series> {
        self.series.get(&entity_key(entity))
    }

    /// Display labels in key order
    pub fn labels(&self) -> Vec<&str> {
        self.series.values().map(|s| s.label()).collect()
    }

    /// Series in key order
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Fingerprint of the record store this catalog was built from
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Builds per-entity series from raw observations
#[derive(Debug, Default)]
pub struct SeriesBuilder;

impl SeriesBuilder {
    /// Partition, order and summarize every entity in the store
    pub fn build(store: &RecordStore) -> Result<SeriesCatalog> {
        let mut partitions: BTreeMap<String, (Vec<SeriesPoint>, BTreeSet<String>)> = BTreeMap::new();
        for obs in store.observations() {
            let (points, regions) = partitions.entry(obs.entity_key()).or_default();
            points.push(SeriesPoint {
                date: obs.period_start(),
                price: obs.price(),
            });
            if !obs.region().is_empty() {
                regions.insert(obs.region().to_string());
            }
        }

        let mut series = BTreeMap::new();
        for (key, (points, regions)) in partitions {
            if points.is_empty() {
                return Err(ForecastError::EmptyPartition { entity: key });
            }
            let built = Series::with_regions(&key, points, regions.into_iter().collect())?;
            debug!(entity = built.label(), points = built.len(), "built series");
            series.insert(key, built);
        }

        info!(entities = series.len(), "series catalog ready");
        Ok(SeriesCatalog {
            series,
            fingerprint: store.fingerprint(),
        })
    }
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// A word starts at any letter that follows a non-letter, so
/// "green gram" becomes "Green Gram" and "COTTON" becomes "Cotton".
pub fn title_case(label: &str) -> String {
    let mut result = String::with_capacity(label.len());
    let mut at_word_start = true;
    for ch in label.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(ch);
            at_word_start = true;
        }
    }
    result
}
