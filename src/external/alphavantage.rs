use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{PriceBar, TickerInfo};

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn from_env() -> Result<Self, PriceProviderError> {
        let api_key = std::env::var("ALPHAVANTAGE_API_KEY")
            .map_err(|_| PriceProviderError::BadResponse("ALPHAVANTAGE_API_KEY not set".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AvDailyAdjustedResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, AvDailyBar>>,

    // When rate-limited Alpha Vantage returns:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    // When invalid:
    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvDailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: String,
    #[serde(rename = "6. volume")]
    volume: String,
}

#[derive(Debug, Deserialize)]
struct AvSearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Option<Vec<AvSearchMatch>>,

    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvSearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
}

fn parse_field(value: &str) -> Result<f64, PriceProviderError> {
    value
        .parse::<f64>()
        .map_err(|e| PriceProviderError::Parse(e.to_string()))
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceProviderError> {
        // compact covers the latest ~100 points; anything longer needs full
        let span_days = (end - start).num_days();
        let outputsize = if span_days <= 100 { "compact" } else { "full" };

        let url = "https://www.alphavantage.co/query";

        let resp = self
            .client
            .get(url)
            .query(&[
                ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                ("symbol", ticker),
                ("outputsize", outputsize),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<AvDailyAdjustedResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if body.note.is_some() {
            // This is the throttle response
            return Err(PriceProviderError::RateLimited);
        }

        if let Some(msg) = body.error_message {
            return Err(PriceProviderError::BadResponse(msg));
        }

        let series = body
            .time_series
            .ok_or_else(|| PriceProviderError::BadResponse("missing time series".into()))?;

        // series is keyed by "YYYY-MM-DD" strings; BTreeMap iterates ascending
        let mut out: Vec<PriceBar> = Vec::new();

        for (date_str, bar) in series {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

            if date < start || date > end {
                continue;
            }

            out.push(PriceBar {
                date,
                open: parse_field(&bar.open)?,
                high: parse_field(&bar.high)?,
                low: parse_field(&bar.low)?,
                close: parse_field(&bar.close)?,
                adj_close: parse_field(&bar.adjusted_close)?,
                volume: bar
                    .volume
                    .parse::<u64>()
                    .map_err(|e| PriceProviderError::Parse(e.to_string()))?,
            });
        }

        Ok(out)
    }

    async fn search_ticker(
        &self,
        keyword: &str,
    ) -> Result<Vec<TickerInfo>, PriceProviderError> {
        let url = "https://www.alphavantage.co/query";

        let resp = self
            .client
            .get(url)
            .query(&[
                ("function", "SYMBOL_SEARCH"),
                ("keywords", keyword),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<AvSearchResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if body.note.is_some() {
            return Err(PriceProviderError::RateLimited);
        }

        let matches = body
            .best_matches
            .unwrap_or_default()
            .into_iter()
            .map(|m| TickerInfo {
                symbol: m.symbol,
                name: m.name,
            })
            .collect();

        Ok(matches)
    }
}
