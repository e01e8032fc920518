use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Bearer authentication: resolves the token through the credential store and
/// injects the resulting `UserIdentity` into request extensions.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?
        .to_string();

    let user = state.credentials.verify_token(&token).await.map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        ApiError::unauthorized("Invalid token")
    })?;

    tracing::debug!("Authenticated {} ({})", user.email, user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}
