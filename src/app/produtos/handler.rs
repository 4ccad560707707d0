//! 产品处理器

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::Json,
};
use tracing::debug;

use super::model::{Product, ProductId};
use crate::app::AppState;
use crate::web::error::ApiError;

/// GET /api/produtos
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .query(state.store.list())
        .await
        .map_err(ApiError::ListFailed)?;
    debug!(count = products.len(), "返回产品列表");
    Ok(Json(products))
}

/// GET /api/produtos/:id
pub async fn get_product(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(raw_id) = path?;
    let id: ProductId = raw_id.parse()?;

    match state
        .query(state.store.find(id))
        .await
        .map_err(ApiError::FetchFailed)?
    {
        Some(product) => Ok(Json(product)),
        None => {
            debug!(%id, "产品不存在");
            Err(ApiError::NotFound)
        }
    }
}
