mod app;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::external::alphavantage::AlphaVantageProvider;
use crate::external::mock::MockProvider;
use crate::external::news_provider::{NewsApiProvider, NewsConfig, NewsProvider};
use crate::external::price_provider::PriceProvider;
use crate::external::yahoo::YahooProvider;
use crate::services::reference::NameCache;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(logging::LoggingConfig::from_env())?;

    // Select price provider based on PRICE_PROVIDER env var (defaults to yahoo)
    let provider_name =
        std::env::var("PRICE_PROVIDER").unwrap_or_else(|_| "yahoo".to_string());

    let price_provider: Arc<dyn PriceProvider> = match provider_name.to_lowercase().as_str() {
        "yahoo" => {
            tracing::info!("📊 Using price provider: Yahoo Finance");
            Arc::new(YahooProvider::new())
        }
        "alphavantage" => {
            tracing::info!("📊 Using price provider: Alpha Vantage");
            Arc::new(
                AlphaVantageProvider::from_env()
                    .expect("Failed to create AlphaVantageProvider (check ALPHAVANTAGE_API_KEY)"),
            )
        }
        "mock" => {
            tracing::info!("📊 Using price provider: mock random walk (offline)");
            Arc::new(MockProvider::new())
        }
        _ => {
            panic!(
                "Invalid PRICE_PROVIDER: {}. Must be 'yahoo', 'alphavantage', or 'mock'",
                provider_name
            );
        }
    };

    let news_config = NewsConfig::from_env();
    let news_provider: Option<Arc<dyn NewsProvider>> = match news_config.api_key {
        Some(api_key) => {
            tracing::info!("📰 Using news provider: NewsAPI");
            Some(Arc::new(NewsApiProvider::new(api_key)))
        }
        None => {
            tracing::warn!("NEWS_API_KEY not set - sentiment endpoints are disabled");
            None
        }
    };

    let state = AppState {
        price_provider,
        news_provider,
        name_cache: NameCache::new(),
    };
    let app = app::create_app(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Eventlens backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
