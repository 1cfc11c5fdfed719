use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{PriceBar, TickerInfo};

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("ticker not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily bars for one instrument over [start, end]. Rows may arrive in
    /// any order and may repeat dates; normalization happens downstream.
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceProviderError>;

    async fn search_ticker(
        &self,
        keyword: &str,
    ) -> Result<Vec<TickerInfo>, PriceProviderError>;
}
