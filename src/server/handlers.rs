//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;
use crate::engine::TextClassifier;

/// Shared application state
pub struct AppState {
    pub classifier: Arc<dyn TextClassifier>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

/// Liveness probe, independent of model state
pub async fn isalive() -> impl IntoResponse {
    StatusCode::OK
}

/// Classify every instance of the request body
///
/// The body is read as JSON whatever the `Content-Type`, on GET as well as
/// POST.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let texts = parse_instances(&body)?;
    let classifier = Arc::clone(&state.classifier);

    let predictions = tokio::task::spawn_blocking(move || classifier.classify(&texts))
        .await
        .map_err(|e| ApiError::Inference(e.to_string()))?
        .map_err(|e| ApiError::Inference(format!("{:#}", e)))?;

    Ok(Json(PredictResponse {
        predictions: predictions.into_iter().map(|p| p.label).collect(),
    }))
}

fn parse_instances(body: &[u8]) -> Result<Vec<String>, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::BadRequest)?;
    if is_falsy(&value) {
        return Err(ApiError::BadRequest);
    }

    // `Value::get` is `None` on anything but an object, so arrays are
    // rejected at both levels.
    let instances = value
        .get("instances")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Malformed("expected an `instances` array".to_string()))?;

    instances
        .iter()
        .enumerate()
        .map(|(index, instance)| {
            instance
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ApiError::Malformed(format!("instance {} has no string `text`", index))
                })
        })
        .collect()
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

// Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<String>,
}
