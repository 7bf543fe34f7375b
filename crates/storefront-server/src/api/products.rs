use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use storefront_core::Product;
use storefront_store::ProductDetail;

use crate::middleware::RequestId;

use super::{map_catalog_error, normalize_limit, not_found, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = state
        .catalog
        .list_products(normalize_limit(query.limit))
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(products, req_id.0)))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let detail = state
        .catalog
        .product_detail(&id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone(), "product", &id))?;

    Ok(Json(ApiResponse::new(detail, req_id.0)))
}
