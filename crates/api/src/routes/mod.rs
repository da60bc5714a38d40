//! Route handlers and shared request helpers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use store::Page;
use uuid::Uuid;

use crate::error::ApiError;

/// Wraps response data in the standard success envelope.
pub(crate) fn ok_envelope(data: Value) -> Json<Value> {
    Json(serde_json::json!({ "ok": true, "data": data }))
}

/// Parses a UUID path segment, rejecting malformed input as a
/// validation failure.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::Validation(format!("invalid ID format: {e}")))
}

/// Query-string pagination parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Converts to a validated [`Page`], defaulting to the first page.
    pub(crate) fn into_page(self) -> Result<Page, ApiError> {
        let number = self.page.unwrap_or(1);
        let size = self.limit.unwrap_or(Page::DEFAULT_SIZE);
        Page::new(number, size).ok_or_else(|| {
            ApiError::Validation(format!("invalid pagination: page={number} limit={size}"))
        })
    }
}
