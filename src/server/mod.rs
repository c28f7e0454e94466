//! HTTP server for inference
//!
//! Two endpoints: `GET /isalive` and `GET|POST /predict`.

mod error;
mod handlers;
mod routes;
mod timing;

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::DefaultBodyLimit, middleware, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::engine::TextClassifier;

pub use error::{ApiError, ErrorResponse};
pub use handlers::{AppState, PredictResponse};
pub use routes::api_routes;

/// Build the application router
pub fn router(classifier: Arc<dyn TextClassifier>, config: &ServerConfig) -> Router {
    let state = Arc::new(AppState::new(classifier));

    let mut app = Router::new()
        .merge(api_routes())
        .layer(DefaultBodyLimit::max(config.max_body_size));

    if config.request_logging {
        app = app.layer(middleware::from_fn(timing::log_latency));
    }

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Start the HTTP inference server
pub async fn start(classifier: Arc<dyn TextClassifier>, config: ServerConfig) -> Result<()> {
    let app = router(classifier, &config);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET      /isalive - Liveness check");
    tracing::info!("  GET|POST /predict - Classify instances");

    axum::serve(listener, app).await?;

    Ok(())
}
