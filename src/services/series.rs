use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::{PriceBar, PricePoint, PriceSeries};

/// Builds the canonical per-instrument series from raw provider bars:
/// adjusted close only, one row per date (a later bar for the same date
/// replaces the earlier one), ascending by date, with the trading-day
/// position given by the vector index.
pub fn normalize(ticker: &str, bars: Vec<PriceBar>) -> Result<PriceSeries, AppError> {
    // BTreeMap both deduplicates (later insert wins) and orders by date
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for bar in bars {
        by_date.insert(bar.date, bar.adj_close);
    }

    if by_date.is_empty() {
        return Err(AppError::EmptySeries {
            ticker: ticker.to_string(),
        });
    }

    let mut points: Vec<PricePoint> = Vec::with_capacity(by_date.len());
    let mut prev: Option<f64> = None;
    for (date, adj_close) in by_date {
        let daily_return = prev.map(|p| adj_close / p - 1.0);
        points.push(PricePoint {
            date,
            adj_close,
            daily_return,
        });
        prev = Some(adj_close);
    }

    Ok(PriceSeries {
        ticker: ticker.to_string(),
        points,
    })
}
