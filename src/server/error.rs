//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Body absent, not JSON, or a falsy JSON value
    #[error("bad request")]
    BadRequest,

    /// JSON without the `instances[].text` shape
    #[error("malformed request: {0}")]
    Malformed(String),

    /// Tokenization or model failure on any instance
    #[error("inference failed: {0}")]
    Inference(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Soft error: clients read `code` from a 200 response.
            ApiError::BadRequest => (
                StatusCode::OK,
                Json(ErrorResponse {
                    code: StatusCode::FORBIDDEN.as_u16(),
                    message: self.to_string(),
                }),
            )
                .into_response(),
            ApiError::Malformed(_) | ApiError::Inference(_) => {
                tracing::error!("{}", self);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (
                    status,
                    Json(ErrorResponse {
                        code: status.as_u16(),
                        message: self.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
