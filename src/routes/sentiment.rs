use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::services::sentiment::{self, SentimentResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker", get(analyze))
}

fn default_days() -> i64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct SentimentQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

pub async fn analyze(
    Path(ticker): Path<String>,
    Query(query): Query<SentimentQuery>,
    State(state): State<AppState>,
) -> Result<Json<SentimentResponse>, AppError> {
    info!("GET /sentiment/{} - Analyzing {} days", ticker, query.days);

    if !(1..=90).contains(&query.days) {
        return Err(AppError::Validation(
            "days must be between 1 and 90".to_string(),
        ));
    }

    let news_provider = state.news_provider.as_ref().ok_or_else(|| {
        AppError::Unavailable("news provider not configured (set NEWS_API_KEY)".to_string())
    })?;

    let response = sentiment::analyze_ticker(
        state.price_provider.as_ref(),
        news_provider.as_ref(),
        &state.name_cache,
        &ticker,
        query.days,
    )
    .await
    .map_err(|e| {
        error!("Sentiment analysis failed for {}: {}", ticker, e);
        e
    })?;

    Ok(Json(response))
}
