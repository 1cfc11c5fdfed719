use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::warn;

use crate::external::price_provider::PriceProvider;
use crate::models::TickerInfo;

/// Curated S&P 500 constituents for the ticker picker, used when a live
/// constituent source is unavailable.
const POPULAR_SP500: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc. Class A"),
    ("AMZN", "Amazon.com Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms Inc."),
    ("TSLA", "Tesla Inc."),
    ("BRK.B", "Berkshire Hathaway Inc. Class B"),
    ("JPM", "JPMorgan Chase & Co."),
    ("JNJ", "Johnson & Johnson"),
    ("V", "Visa Inc."),
    ("UNH", "UnitedHealth Group Inc."),
    ("XOM", "Exxon Mobil Corporation"),
    ("PG", "Procter & Gamble Co."),
    ("MA", "Mastercard Inc."),
    ("HD", "Home Depot Inc."),
    ("CVX", "Chevron Corporation"),
    ("BAC", "Bank of America Corp."),
    ("ABBV", "AbbVie Inc."),
    ("KO", "Coca-Cola Co."),
    ("PEP", "PepsiCo Inc."),
    ("COST", "Costco Wholesale Corporation"),
    ("AVGO", "Broadcom Inc."),
    ("MRK", "Merck & Co. Inc."),
    ("TMO", "Thermo Fisher Scientific Inc."),
    ("WMT", "Walmart Inc."),
    ("CSCO", "Cisco Systems Inc."),
    ("DIS", "Walt Disney Co."),
    ("ABT", "Abbott Laboratories"),
    ("ACN", "Accenture plc"),
    ("ADBE", "Adobe Inc."),
    ("AMD", "Advanced Micro Devices Inc."),
    ("NFLX", "Netflix Inc."),
    ("NKE", "NIKE Inc."),
    ("ORCL", "Oracle Corporation"),
    ("CRM", "Salesforce Inc."),
    ("INTC", "Intel Corporation"),
    ("QCOM", "QUALCOMM Inc."),
    ("TXN", "Texas Instruments Inc."),
    ("UPS", "United Parcel Service Inc."),
    ("BA", "Boeing Co."),
    ("CAT", "Caterpillar Inc."),
    ("GE", "General Electric Co."),
    ("IBM", "International Business Machines Corp."),
    ("MMM", "3M Co."),
    ("GS", "Goldman Sachs Group Inc."),
    ("SPGI", "S&P Global Inc."),
    ("BLK", "BlackRock Inc."),
    ("AXP", "American Express Co."),
    ("NOW", "ServiceNow Inc."),
];

const NAME_TTL_HOURS: i64 = 24;

pub fn sp500_list() -> Vec<TickerInfo> {
    POPULAR_SP500
        .iter()
        .map(|&(symbol, name)| TickerInfo {
            symbol: symbol.to_string(),
            name: name.to_string(),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct CachedName {
    name: String,
    fetched_at: DateTime<Utc>,
}

/// Process-wide, time-bounded cache of company-name lookups. Owned by the
/// reference-data layer; the analytics core never sees it.
#[derive(Clone)]
pub struct NameCache {
    cache: Arc<DashMap<String, CachedName>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, ticker: &str) -> Option<String> {
        if let Some(entry) = self.cache.get(ticker) {
            let cached = entry.value().clone();
            if Utc::now() < cached.fetched_at + Duration::hours(NAME_TTL_HOURS) {
                return Some(cached.name);
            }
            drop(entry); // release the read lock before removal
            self.cache.remove(ticker);
        }
        None
    }

    pub fn insert(&self, ticker: &str, name: &str) {
        self.cache.insert(
            ticker.to_string(),
            CachedName {
                name: name.to_string(),
                fetched_at: Utc::now(),
            },
        );
    }
}

/// Company display name for a ticker, cached for 24 hours. Falls back to
/// the symbol itself when the provider has no exact match; lookup failures
/// are not cached so a transient outage retries next time.
pub async fn company_name(
    cache: &NameCache,
    provider: &dyn PriceProvider,
    ticker: &str,
) -> String {
    if let Some(name) = cache.get(ticker) {
        return name;
    }

    match provider.search_ticker(ticker).await {
        Ok(matches) => {
            let name = matches
                .into_iter()
                .find(|m| m.symbol.eq_ignore_ascii_case(ticker))
                .map(|m| m.name)
                .unwrap_or_else(|| ticker.to_string());
            cache.insert(ticker, &name);
            name
        }
        Err(e) => {
            warn!("Company name lookup failed for {}: {}", ticker, e);
            ticker.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mock::MockProvider;

    #[test]
    fn test_sp500_list_has_the_usual_names() {
        let list = sp500_list();
        assert_eq!(list.len(), 50);
        assert!(list.iter().any(|t| t.symbol == "NVDA"));
        assert!(list.iter().any(|t| t.name.contains("Apple")));
    }

    #[test]
    fn test_cache_roundtrip() {
        let cache = NameCache::new();
        assert_eq!(cache.get("NVDA"), None);

        cache.insert("NVDA", "NVIDIA Corporation");
        assert_eq!(cache.get("NVDA"), Some("NVIDIA Corporation".to_string()));
        assert_eq!(cache.get("AMD"), None);
    }

    #[tokio::test]
    async fn test_company_name_uses_provider_then_cache() {
        let cache = NameCache::new();
        let provider = MockProvider::new();

        let name = company_name(&cache, &provider, "NVDA").await;
        assert_eq!(name, "NVDA Mock Company");

        // second call is served from the cache
        assert_eq!(cache.get("NVDA"), Some("NVDA Mock Company".to_string()));
    }
}
