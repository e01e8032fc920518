use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AccountAttributes;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_json_body, RawBody};

use super::{credentials_body, non_empty, require_credentials};

#[derive(Debug, Deserialize)]
struct RegisterBody {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

/// POST /auth/register - create a confirmed account
///
/// ```json
/// { "email": "string", "password": "string", "display_name": "string?" }
/// ```
pub async fn register(
    State(state): State<AppState>,
    RawBody(body): RawBody,
) -> ApiResult<Json<Value>> {
    let body: RegisterBody = credentials_body(parse_json_body(&body)?)?;
    let (email, password) = require_credentials(body.email, body.password)?;
    let display_name = non_empty(body.display_name);

    let user = state
        .credentials
        .create_account(
            &email,
            &password,
            AccountAttributes {
                display_name: display_name.clone(),
            },
        )
        .await
        .map_err(|e| {
            tracing::warn!("Registration rejected for {}: {}", email, e);
            ApiError::bad_request(e.to_string())
        })?;

    // The account exists at this point; a profile write failure does not undo it.
    if let Some(name) = display_name {
        if let Err(e) = state.profiles.set_display_name(user.id, &name).await {
            tracing::warn!("Failed to store display name for {}: {}", user.id, e);
        }
    }

    tracing::info!("Registered account {}", user.id);
    Ok(Json(json!({ "message": "User registered successfully" })))
}
