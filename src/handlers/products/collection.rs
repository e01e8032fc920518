use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::UserIdentity;
use crate::database::ProductQuery;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{parse_json_body, QueryParams, RawBody};

use super::request::CreateProductRequest;
use super::view::ProductView;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Only rows owned by this account.
    pub user_id: Option<String>,
}

/// GET /products - every product, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let query = ProductQuery {
        user_id: owner_filter(params.user_id.as_deref())?,
    };

    let rows = state.products.query(&query).await?;
    let views = rows
        .into_iter()
        .map(|row| ProductView::from_listing(row, &user))
        .collect();

    Ok(Json(views))
}

/// POST /products - create a product owned by the requester
///
/// Responds 200 with the inserted row, not 201.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RawBody(body): RawBody,
) -> ApiResult<Json<ProductView>> {
    let request = CreateProductRequest::from_json(parse_json_body(&body)?)?;

    let product = state.products.insert(request.into_new_product(user.id)).await?;
    tracing::info!("Product {} created by {}", product.id, user.id);

    Ok(Json(ProductView::for_viewer(product, &user)))
}

fn owner_filter(raw: Option<&str>) -> ApiResult<Option<Uuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw).map(Some).map_err(|_| {
            ApiError::bad_request(format!("invalid input syntax for type uuid: \"{}\"", raw))
        }),
    }
}
