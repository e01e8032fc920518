use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::UserIdentity;

/// GET /auth/me - the authenticated account and its stored profile
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> Json<Value> {
    let profile = state.profiles.profile(user.id).await.unwrap_or_else(|e| {
        tracing::warn!("Profile lookup for {} failed: {}", user.id, e);
        None
    });

    Json(json!({ "user": user, "profile": profile }))
}
