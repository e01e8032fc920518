use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;

/// GET /health - public; pings the record store
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();

    match state.products.ping().await {
        Ok(()) => Json(json!({
            "status": "ok",
            "timestamp": now,
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("database unavailable").into_response()
        }
    }
}
