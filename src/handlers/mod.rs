// handlers/mod.rs - HTTP handlers
//
// products: owner-scoped catalog resource (bearer auth on every route)
// auth:     account registration, password login, current user
// health:   public liveness check against the record store

pub mod auth;
pub mod extract;
pub mod health;
pub mod products;

pub use extract::{QueryParams, RawBody};
pub use health::health;

use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Fallback for unmatched paths and unmatched methods on known paths.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

/// Parse a raw request body. Malformed JSON is a processing failure (500),
/// not a validation failure; schema checks happen afterwards.
pub(crate) fn parse_json_body(body: &[u8]) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!("Failed to parse request body: {}", e);
        ApiError::internal_server_error(e.to_string())
    })
}
