//! Market-wide rankings across every series

use crate::series::{Series, SeriesCatalog};
use serde::Serialize;
use std::cmp::Ordering;

/// A series label with the figure it was ranked by
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRanking {
    pub label: String,
    pub value: f64,
}

fn rank_by<F>(catalog: &SeriesCatalog, n: usize, score: F) -> Vec<PriceRanking>
where
    F: Fn(&Series) -> f64,
{
    let mut ranked: Vec<PriceRanking> = catalog
        .iter()
        .map(|series| PriceRanking {
            label: series.label().to_string(),
            value: score(series),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.truncate(n);
    ranked
}

/// Top `n` series by latest price, highest first
pub fn highest_priced(catalog: &SeriesCatalog, n: usize) -> Vec<PriceRanking> {
    rank_by(catalog, n, |series| series.summary().latest_price)
}

/// Top `n` series by size of the last month-over-month change.
///
/// Ranked by absolute change; the reported value keeps its sign.
pub fn most_volatile(catalog: &SeriesCatalog, n: usize) -> Vec<PriceRanking> {
    let mut ranked = rank_by(catalog, usize::MAX, |series| {
        series.summary().last_change_pct.abs()
    });
    ranked.truncate(n);
    for entry in ranked.iter_mut() {
        if let Some(series) = catalog.get(&entry.label) {
            entry.value = series.summary().last_change_pct;
        }
    }
    ranked
}
