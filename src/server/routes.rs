//! Route definitions

use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::{isalive, predict, AppState};

/// Create the API router
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Liveness probe
        .route("/isalive", get(isalive))
        // Classification
        .route("/predict", get(predict).post(predict))
}
