use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{PriceBar, TickerInfo};

/// Offline provider: a random-walk daily series over weekdays. Lets the
/// whole pipeline run without API keys (local development, integration
/// tests).
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    async fn fetch_daily_history(
        &self,
        _ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceProviderError> {
        let mut out = Vec::new();
        let mut current = 100.0_f64;
        let mut date = start;

        while date <= end {
            // weekends are non-trading days, so alignment has gaps to work on
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                current *= 1.0 + (rand::random::<f64>() - 0.5) * 0.02;

                let close = current;
                let open = close * (1.0 + (rand::random::<f64>() - 0.5) * 0.01);
                let high = close.max(open) * (1.0 + rand::random::<f64>() * 0.005);
                let low = close.min(open) * (1.0 - rand::random::<f64>() * 0.005);

                out.push(PriceBar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    adj_close: close,
                    volume: 1_000_000 + (rand::random::<f64>() * 500_000.0) as u64,
                });
            }
            date += Duration::days(1);
        }

        Ok(out)
    }

    async fn search_ticker(
        &self,
        keyword: &str,
    ) -> Result<Vec<TickerInfo>, PriceProviderError> {
        let symbol = keyword.trim().to_uppercase();
        if symbol.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![TickerInfo {
            name: format!("{} Mock Company", symbol),
            symbol,
        }])
    }
}
