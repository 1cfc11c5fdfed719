use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{event_study, health, prices, sentiment, tickers};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/tickers", tickers::router())
        .nest("/api/prices", prices::router())
        .nest("/api/event-study", event_study::router())
        .nest("/api/sentiment", sentiment::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
