use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{PriceBar, TickerInfo};

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    #[allow(dead_code)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooSearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceProviderError> {
        // period2 is exclusive, so push it one day past the requested end
        let period1 = midnight_timestamp(start);
        let period2 = midnight_timestamp(end + Duration::days(1));

        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?period1={period1}&period2={period2}&interval=1d&events=div%7Csplit"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PriceProviderError::NotFound);
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let result = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| PriceProviderError::BadResponse("missing result".into()))?;

        let timestamps = result.timestamp.unwrap_or_default();

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| PriceProviderError::BadResponse("missing quote".into()))?;

        // The adjusted close series is what the analytics consume; bars
        // without one are useless and get skipped below.
        let adjcloses = result
            .indicators
            .adjclose
            .and_then(|mut a| a.pop())
            .ok_or_else(|| PriceProviderError::BadResponse("missing adjclose".into()))?
            .adjclose;

        let mut out = Vec::new();

        for (i, ts) in timestamps.iter().enumerate() {
            let close = quote.close.get(i).copied().flatten();
            let adj_close = adjcloses.get(i).copied().flatten();

            // skip bars with a missing close or adjusted close
            let (Some(close), Some(adj_close)) = (close, adj_close) else {
                continue;
            };

            let dt = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| PriceProviderError::Parse("bad timestamp".into()))?;

            out.push(PriceBar {
                date: dt.date_naive(),
                open: quote.open.get(i).copied().flatten().unwrap_or(close),
                high: quote.high.get(i).copied().flatten().unwrap_or(close),
                low: quote.low.get(i).copied().flatten().unwrap_or(close),
                close,
                adj_close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        Ok(out)
    }

    async fn search_ticker(
        &self,
        keyword: &str,
    ) -> Result<Vec<TickerInfo>, PriceProviderError> {
        let url = format!(
            "https://query1.finance.yahoo.com/v1/finance/search?q={keyword}&quotesCount=10&newsCount=0"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }

        let body = resp
            .json::<YahooSearchResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let matches = body
            .quotes
            .into_iter()
            .filter_map(|q| {
                let symbol = q.symbol?;
                let name = q.longname.or(q.shortname).unwrap_or_else(|| symbol.clone());
                Some(TickerInfo { symbol, name })
            })
            .collect();

        Ok(matches)
    }
}
