//! API error type with envelope-formatted HTTP responses.
//!
//! Status mapping: 404 for missing resources, 400 for out-of-stock,
//! 422 for request-shape validation failures, 500 for internal failures.
//! Internal detail is logged server-side and never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders::OrderError;
use store::StoreError;

/// API-level error that maps to an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Policy rejection: insufficient stock.
    OutOfStock(String),
    /// Request failed structural validation.
    Validation(String),
    /// Internal server error; message is logged, not returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::OutOfStock(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "ok": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            OrderError::OutOfStock(_) => ApiError::OutOfStock(err.to_string()),
            OrderError::EmptyOrder | OrderError::InvalidQuantity(_) => {
                ApiError::Validation(err.to_string())
            }
            OrderError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
