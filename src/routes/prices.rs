use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::PriceSeries;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker", get(get_prices))
}

#[derive(Debug, Deserialize)]
pub struct PriceRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Normalized daily series (adjusted close + daily returns) for a ticker.
/// Defaults to the trailing two years when no range is given.
pub async fn get_prices(
    Path(ticker): Path<String>,
    Query(range): Query<PriceRangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<PriceSeries>, AppError> {
    info!("GET /prices/{} - Getting normalized price history", ticker);

    let end = range.end.unwrap_or_else(|| Utc::now().date_naive());
    let start = range.start.unwrap_or(end - Duration::days(730));
    if start > end {
        return Err(AppError::Validation(
            "start date must not be after end date".to_string(),
        ));
    }

    let bars = state
        .price_provider
        .fetch_daily_history(&ticker, start, end)
        .await
        .map_err(|e| {
            error!("Failed to fetch price history for {}: {}", ticker, e);
            AppError::from(e)
        })?;

    let series = services::series::normalize(&ticker, bars)?;
    Ok(Json(series))
}
