// handlers/auth - account endpoints
//
// register and login are public; me sits behind bearer authentication.
// Account storage and token issuance belong to the credential store.

pub mod login;
pub mod me;
pub mod register;

pub use login::login;
pub use me::me;
pub use register::register;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

const CREDENTIALS_REQUIRED: &str = "Email and password are required";

/// Decode an auth request body; anything that is not an object lacks credentials.
fn credentials_body<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    if !body.is_object() {
        return Err(ApiError::bad_request(CREDENTIALS_REQUIRED));
    }
    serde_json::from_value(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Both credentials, or the standard 400.
fn require_credentials(
    email: Option<String>,
    password: Option<String>,
) -> ApiResult<(String, String)> {
    match (non_empty(email), non_empty(password)) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(ApiError::bad_request(CREDENTIALS_REQUIRED)),
    }
}
