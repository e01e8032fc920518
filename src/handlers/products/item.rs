use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts, Path, State},
    http::request::Parts,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::UserIdentity;
use crate::database::Product;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_json_body, RawBody};

use super::request::patch_from_json;
use super::view::ProductView;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// The `:id` segment of an item route. Ids that fail to decode or are not
/// UUIDs cannot name a row, so they are rejected as a missing product.
pub struct ProductId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ProductId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Unreadable product id: {}", rejection.body_text());
                ApiError::not_found(PRODUCT_NOT_FOUND)
            })?;

        Uuid::parse_str(&raw)
            .map(Self)
            .map_err(|_| ApiError::not_found(PRODUCT_NOT_FOUND))
    }
}

/// GET /products/:id - any authenticated account may read
pub async fn read(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ProductId(id): ProductId,
) -> ApiResult<Json<ProductView>> {
    let product = load(&state, id).await?;
    Ok(Json(ProductView::for_viewer(product, &user)))
}

/// PUT /products/:id - owner only; `id` and `user_id` in the body are ignored
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ProductId(id): ProductId,
    RawBody(body): RawBody,
) -> ApiResult<Json<ProductView>> {
    let product = load(&state, id).await?;
    ensure_owner(&product, &user, "update")?;

    let patch = patch_from_json(parse_json_body(&body)?)?;
    let updated = state.products.update(product.id, patch).await?;
    tracing::info!("Product {} updated by {}", updated.id, user.id);

    Ok(Json(ProductView::for_viewer(updated, &user)))
}

/// DELETE /products/:id - owner only
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    ProductId(id): ProductId,
) -> ApiResult<Json<Value>> {
    let product = load(&state, id).await?;
    ensure_owner(&product, &user, "delete")?;

    state.products.delete(product.id).await?;
    tracing::info!("Product {} deleted by {}", product.id, user.id);

    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// Resolve the row before any method or ownership check. Failed lookups read
/// as a missing product.
async fn load(state: &AppState, id: Uuid) -> ApiResult<Product> {
    match state.products.find(id).await {
        Ok(Some(product)) => Ok(product),
        Ok(None) => Err(ApiError::not_found(PRODUCT_NOT_FOUND)),
        Err(e) => {
            tracing::warn!("Lookup of product {} failed: {}", id, e);
            Err(ApiError::not_found(PRODUCT_NOT_FOUND))
        }
    }
}

fn ensure_owner(product: &Product, user: &UserIdentity, action: &str) -> ApiResult<()> {
    if user.owns(product) {
        return Ok(());
    }
    tracing::warn!(
        "User {} denied {} on product {} owned by {}",
        user.id,
        action,
        product.id,
        product.user_id
    );
    Err(ApiError::forbidden(format!(
        "You do not have permission to {} this product",
        action
    )))
}
