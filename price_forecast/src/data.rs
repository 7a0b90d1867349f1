//! Raw price observations and the loader that validates them
//!
//! The input table has a header row followed by five positional columns:
//! `entity, year, month-name, price, region`. Header names are not
//! interpreted, so the embedded dataset's
//! `Crop,Year,Month,Average_Wholesale_Price (Rs/quintal),Market_Name` header and
//! any renamed variant are accepted. Every row is validated here; the first
//! bad row aborts the whole load.

use crate::error::{ForecastError, Result};
use crate::utils::first_of_month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;
use xxhash_rust::xxh3::Xxh3;

/// Monthly wholesale prices for twelve crops, January 2020 to December 2024
pub const EMBEDDED_DATASET: &str = include_str!("../data/crop_prices.csv");

/// Number of positional columns in the input table
pub const COLUMN_COUNT: usize = 5;

/// Calendar month of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// All months in calendar order
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Month number, 1 for January
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    /// Month for a 1-based number
    pub fn from_number(number: u32) -> Option<Self> {
        Self::ALL.get(number.checked_sub(1)? as usize).copied()
    }

    /// Full English name
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A month name that matched neither a full name nor a three-letter abbreviation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized month name '{0}'")]
pub struct ParseMonthError(pub String);

impl FromStr for Month {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| {
                let name = m.name().to_lowercase();
                name == wanted || (wanted.len() == 3 && name.starts_with(&wanted))
            })
            .ok_or_else(|| ParseMonthError(s.to_string()))
    }
}

/// One validated row of the input table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    entity: String,
    year: i32,
    month: Month,
    price: f64,
    region: String,
    period_start: NaiveDate,
}

impl Observation {
    /// Create an observation, rejecting empty labels and non-positive prices
    pub fn new(entity: &str, year: i32, month: Month, price: f64, region: &str) -> Result<Self> {
        let entity = entity.trim();
        if entity.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Entity label must not be empty".to_string(),
            ));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Price must be a positive number, got {}",
                price
            )));
        }
        let period_start = first_of_month(year, month.number()).ok_or_else(|| {
            ForecastError::InvalidParameter(format!("Year {} is out of range", year))
        })?;

        Ok(Self {
            entity: entity.to_string(),
            year,
            month,
            price,
            region: region.trim().to_string(),
            period_start,
        })
    }

    /// Entity label as it appeared in the input
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Case-folded entity label used for grouping
    pub fn entity_key(&self) -> String {
        entity_key(&self.entity)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// First day of the observation's month
    pub fn period_start(&self) -> NaiveDate {
        self.period_start
    }
}

/// Case-folded grouping key for an entity label
pub fn entity_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Headline figures for a loaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    /// Number of observations
    pub total_records: usize,
    /// Number of distinct entities after case folding
    pub unique_entities: usize,
    /// Earliest year present
    pub first_year: i32,
    /// Latest year present
    pub last_year: i32,
}

/// The full set of validated observations
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
    observations: Vec<Observation>,
    fingerprint: u64,
}

impl RecordStore {
    /// Build a store from observations.
    ///
    /// Fails on an empty table or on two observations for the same entity
    /// and month; rows are numbered from 1 in input order.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::EmptyDataset);
        }

        let mut seen: HashMap<(String, i32, Month), usize> = HashMap::new();
        for (index, obs) in observations.iter().enumerate() {
            let row = index + 1;
            if let Some(first) = seen.insert((obs.entity_key(), obs.year, obs.month), row) {
                return Err(ForecastError::MalformedRecord {
                    row,
                    reason: format!(
                        "duplicate observation for {} {} {} (first seen at row {})",
                        obs.entity, obs.month, obs.year, first
                    ),
                });
            }
        }

        let fingerprint = fingerprint(&observations);
        Ok(Self {
            observations,
            fingerprint,
        })
    }

    /// Observations in input order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Content hash of the table; equal tables hash equal regardless of source
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Record count, entity count and year range
    pub fn summary(&self) -> DatasetSummary {
        let entities: BTreeSet<String> = self.observations.iter().map(|o| o.entity_key()).collect();
        let first_year = self.observations.iter().map(|o| o.year).min().unwrap_or_default();
        let last_year = self.observations.iter().map(|o| o.year).max().unwrap_or_default();

        DatasetSummary {
            total_records: self.observations.len(),
            unique_entities: entities.len(),
            first_year,
            last_year,
        }
    }
}

fn fingerprint(observations: &[Observation]) -> u64 {
    let mut hasher = Xxh3::new();
    for obs in observations {
        hasher.update(obs.entity.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(&obs.year.to_le_bytes());
        hasher.update(&obs.month.number().to_le_bytes());
        hasher.update(&obs.price.to_bits().to_le_bytes());
        hasher.update(obs.region.as_bytes());
        hasher.update(b"\x1e");
    }
    hasher.digest()
}

/// Data loader for price tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a price table from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RecordStore> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!(path = %path.display(), "loading price table");
        Self::from_reader(file)
    }

    /// Load the dataset shipped with the crate
    pub fn embedded() -> Result<RecordStore> {
        Self::from_csv_str(EMBEDDED_DATASET)
    }

    /// Load a price table held in memory
    pub fn from_csv_str(text: &str) -> Result<RecordStore> {
        Self::from_reader(text.as_bytes())
    }

    /// Load a price table from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<RecordStore> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut observations = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let row = index + 1;
            let record = record.map_err(|e| ForecastError::MalformedRecord {
                row,
                reason: e.to_string(),
            })?;
            observations.push(Self::parse_row(row, &record)?);
        }

        let store = RecordStore::new(observations)?;
        let summary = store.summary();
        info!(
            records = summary.total_records,
            entities = summary.unique_entities,
            "price table loaded"
        );
        Ok(store)
    }

    /// Validate one data row
    fn parse_row(row: usize, record: &csv::StringRecord) -> Result<Observation> {
        let malformed = |reason: String| ForecastError::MalformedRecord {
            row,
            reason: format!("{} in [{}]", reason, record.iter().collect::<Vec<_>>().join(",")),
        };

        if record.len() != COLUMN_COUNT {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                COLUMN_COUNT,
                record.len()
            )));
        }

        let entity = &record[0];
        let year = record[1]
            .parse::<i32>()
            .map_err(|e| malformed(format!("invalid year '{}': {}", &record[1], e)))?;
        let month = record[2]
            .parse::<Month>()
            .map_err(|e| malformed(e.to_string()))?;
        let price = record[3]
            .parse::<f64>()
            .map_err(|e| malformed(format!("invalid price '{}': {}", &record[3], e)))?;
        let region = &record[4];

        Observation::new(entity, year, month, price, region).map_err(|e| match e {
            ForecastError::InvalidParameter(reason) => malformed(reason),
            other => malformed(other.to_string()),
        })
    }
}
