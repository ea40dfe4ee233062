//! Tariff-window optimization for scheduled charging
//!
//! Given a series of hourly electricity prices and an eligible charging
//! window, this module selects the cheapest hours to actually move current.
//! The optimizer is pure and stateless; identical inputs always produce
//! identical outputs.

use crate::error::{ElektraError, Result};
use std::collections::BTreeMap;

/// Ordered mapping from hour-aligned Unix timestamps to price per unit
///
/// Keys are not required to be contiguous; a missing hour simply has no data
/// and is never selected. Prices may be negative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    prices: BTreeMap<i64, f64>,
}

impl PriceSeries {
    /// Create an empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the price for an hour
    pub fn insert(&mut self, timestamp: i64, price: f64) {
        self.prices.insert(timestamp, price);
    }

    /// Build a series from a JSON object keyed by stringified timestamps
    ///
    /// Upstream tariff providers deliver `{"1698224400": 0.000125, ...}`.
    /// A non-numeric key is a caller contract violation and fails fast
    /// instead of being skipped, so a broken data source cannot go unnoticed.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut series = Self::new();
        for (key, value) in object {
            let timestamp: i64 = key.parse().map_err(|_| {
                ElektraError::invalid_price_series(format!("Non-numeric timestamp key: {key:?}"))
            })?;
            let price = value.as_f64().ok_or_else(|| {
                ElektraError::invalid_price_series(format!("Non-numeric price for {key}: {value}"))
            })?;
            series.insert(timestamp, price);
        }
        Ok(series)
    }

    /// Number of priced hours in the series
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the series holds no data
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Iterate over `(timestamp, price)` pairs in time order
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.prices.iter().map(|(&ts, &price)| (ts, price))
    }
}

impl FromIterator<(i64, f64)> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = (i64, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

/// Eligible charging range and requested on-duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingWindow {
    /// Inclusive window start, Unix seconds
    pub start: i64,

    /// Exclusive window end, Unix seconds
    pub end: i64,

    /// Number of hours to select within the window
    pub duration_hours: u32,
}

/// Select the cheapest charging hours within the window
///
/// Entries are filtered to `[start, end)`, sorted by price ascending with
/// ties broken toward the earlier timestamp, and the first `duration_hours`
/// are returned sorted ascending by time (consumption order). If fewer
/// priced hours exist than requested, all of them are returned; insufficient
/// data is graceful degradation, not an error.
pub fn select_loading_hours(series: &PriceSeries, window: &LoadingWindow) -> Vec<i64> {
    let mut candidates: Vec<(i64, f64)> = series
        .iter()
        .filter(|(ts, _)| *ts >= window.start && *ts < window.end)
        .collect();

    candidates.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    candidates.truncate(window.duration_hours as usize);

    let mut hours: Vec<i64> = candidates.into_iter().map(|(ts, _)| ts).collect();
    hours.sort_unstable();
    hours
}
