use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::TickerInfo;
use crate::services::reference;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickers))
        .route("/search/:keyword", get(search_tickers))
}

async fn list_tickers() -> Json<Vec<TickerInfo>> {
    info!("GET /tickers - Listing S&P 500 tickers");
    Json(reference::sp500_list())
}

async fn search_tickers(
    Path(keyword): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TickerInfo>>, AppError> {
    info!("GET /tickers/search/{} - Symbol search", keyword);

    let matches = state
        .price_provider
        .search_ticker(&keyword)
        .await
        .map_err(|e| {
            error!("Symbol search failed for {}: {}", keyword, e);
            AppError::from(e)
        })?;

    Ok(Json(matches))
}
