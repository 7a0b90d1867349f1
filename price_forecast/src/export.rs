//! CSV export of forecasts and historical series

use crate::error::Result;
use crate::models::{ForecastPoint, ForecastResult};
use crate::series::Series;
use crate::utils::round2;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Header of an exported forecast table
pub const FORECAST_HEADER: [&str; 4] = ["month", "predicted", "lower", "upper"];

/// Header of an exported history table
pub const SERIES_HEADER: [&str; 2] = ["month", "price"];

/// One row of an exported forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// First day of the forecast month
    pub month: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

impl From<&ForecastPoint> for ForecastRow {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            month: point.date,
            predicted: round2(point.point),
            lower: round2(point.lower),
            upper: round2(point.upper),
        }
    }
}

/// Rows of a forecast rounded to two decimals
pub fn forecast_rows(result: &ForecastResult) -> Vec<ForecastRow> {
    result.points().iter().map(ForecastRow::from).collect()
}

/// Write a forecast as `month,predicted,lower,upper`
pub fn write_forecast_csv<W: Write>(result: &ForecastResult, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(FORECAST_HEADER)?;
    for row in forecast_rows(result) {
        csv_writer.write_record([
            row.month.format("%Y-%m-%d").to_string(),
            format!("{:.2}", row.predicted),
            format!("{:.2}", row.lower),
            format!("{:.2}", row.upper),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read a table written by [`write_forecast_csv`]
pub fn read_forecast_csv<R: Read>(reader: R) -> Result<Vec<ForecastRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Write a series history as `month,price`
pub fn write_series_csv<W: Write>(series: &Series, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(SERIES_HEADER)?;
    for point in series.points() {
        csv_writer.write_record([
            point.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", point.price),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Download name for a forecast, e.g. `cotton_price_forecast_20250101.csv`
pub fn forecast_file_name(label: &str, date: NaiveDate) -> String {
    format!(
        "{}_price_forecast_{}.csv",
        label.trim().to_lowercase().replace(' ', "_"),
        date.format("%Y%m%d")
    )
}
