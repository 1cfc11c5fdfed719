use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::services::event_study::{self, EventStudyRequest, EventStudyResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(run))
}

/// Runs the full event-study pipeline: fetch prices, align each labeled
/// group of event dates, compute the HPR table and the overlay matrix.
pub async fn run(
    State(state): State<AppState>,
    Json(req): Json<EventStudyRequest>,
) -> Result<Json<EventStudyResponse>, AppError> {
    info!(
        "POST /event-study - {} with {} date group(s)",
        req.ticker,
        req.groups.len(),
    );

    let response = event_study::run_event_study(state.price_provider.as_ref(), req)
        .await
        .map_err(|e| {
            error!("Event study failed: {}", e);
            e
        })?;

    Ok(Json(response))
}
