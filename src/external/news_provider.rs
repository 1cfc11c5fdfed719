use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::NewsArticle;

/// Configuration for the news layer, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub api_key: Option<String>,
}

impl NewsConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("NEWS_API_KEY").ok(),
        }
    }
}

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(
        &self,
        query: &str,
        from: NaiveDate,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, AppError>;
}

/// NewsAPI.org "everything" endpoint provider.
pub struct NewsApiProvider {
    api_key: String,
    client: Client,
}

impl NewsApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    articles: Option<Vec<NewsApiArticle>>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    source: NewsApiSource,
    title: Option<String>,
    description: Option<String>,
    url: String,
    #[serde(rename = "publishedAt")]
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_news(
        &self,
        query: &str,
        from: NaiveDate,
        max_results: usize,
    ) -> Result<Vec<NewsArticle>, AppError> {
        info!("Fetching news from NewsAPI for query: {}", query);

        let page_size = max_results.min(100).to_string();
        let from_param = from.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get("https://newsapi.org/v2/everything")
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("from", from_param.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("NewsAPI request failed: {}", e);
                AppError::External(format!("News API error: {}", e))
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited);
        }

        let body: NewsApiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse NewsAPI response: {}", e);
            AppError::External(format!("Failed to parse news response: {}", e))
        })?;

        if body.status != "ok" {
            if body.code.as_deref() == Some("rateLimited") {
                return Err(AppError::RateLimited);
            }
            let message = body.message.unwrap_or_else(|| "unknown error".to_string());
            error!("NewsAPI error: {}", message);
            return Err(AppError::External(format!("News API error: {}", message)));
        }

        let articles: Vec<NewsArticle> = body
            .articles
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                Some(NewsArticle {
                    title: item.title?,
                    description: item.description,
                    url: item.url,
                    source: item.source.name.unwrap_or_else(|| "unknown".to_string()),
                    published_at: item.published_at,
                })
            })
            .collect();

        info!("Fetched {} news articles from NewsAPI", articles.len());
        Ok(articles)
    }
}
