//! Calendar helpers for monthly series

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};

/// First day of the given month, if the date exists
pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// First day of the month following `date`
pub fn next_month(date: NaiveDate) -> Result<NaiveDate> {
    first_of_month(date.year(), date.month())
        .and_then(|start| start.checked_add_months(Months::new(1)))
        .ok_or_else(|| {
            ForecastError::InvalidParameter(format!("No month follows {}", date))
        })
}

/// `count` consecutive month starts, beginning one month after `after`
pub fn month_sequence(after: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(count);
    let mut current = after;
    for _ in 0..count {
        current = next_month(current)?;
        dates.push(current);
    }
    Ok(dates)
}

/// "January 2025"
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// "Jan 2025"
pub fn format_short_month(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
