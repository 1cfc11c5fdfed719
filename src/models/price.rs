use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One raw daily bar as delivered by a price provider. Only `date` and
/// `adj_close` survive normalization; the rest is carried for completeness
/// of the provider interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// One observation of the canonical series: trading date, adjusted close,
/// and the simple day-over-day return (None on the first observation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
    pub daily_return: Option<f64>,
}

/// Normalized per-instrument series. Dates are unique and strictly
/// ascending; the index of a point in `points` is its trading-day position.
/// Built once per (ticker, range) request and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Trading calendar: the ascending list of observation dates. Derived
    /// on demand so it can never drift from the series.
    pub fn calendar(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Position of a trading date, if the date has an observation.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |p| p.date).ok()
    }

    pub fn price_at(&self, position: usize) -> f64 {
        self.points[position].adj_close
    }

    pub fn date_at(&self, position: usize) -> NaiveDate {
        self.points[position].date
    }
}
