pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::middleware::request_logging;
use crate::pipeline::{session, SharedSession};

pub use error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            session: session::shared(),
            config: Arc::new(config),
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/upload", post(routes::upload_dataset))
        .route(
            "/api/validate-date-ranges",
            post(routes::validate_date_ranges),
        )
        .route("/api/train-model", post(routes::train_model))
        .route("/api/simulate", get(routes::simulate_stream))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
