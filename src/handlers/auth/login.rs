use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_json_body, RawBody};

use super::{credentials_body, require_credentials};

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// POST /auth/login - exchange email and password for a session
///
/// Responds with `{ "user": {...}, "session": { "access_token", ... } }`.
pub async fn login(
    State(state): State<AppState>,
    RawBody(body): RawBody,
) -> ApiResult<Json<Value>> {
    let body: LoginBody = credentials_body(parse_json_body(&body)?)?;
    let (email, password) = require_credentials(body.email, body.password)?;

    let session = state
        .credentials
        .sign_in(&email, &password)
        .await
        .map_err(|e| {
            tracing::warn!("Login failed for {}: {}", email, e);
            ApiError::unauthorized(e.to_string())
        })?;

    Ok(Json(json!({ "user": session.user, "session": session })))
}
