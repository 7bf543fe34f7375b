use axum::{
    extract::{Path, State},
    Extension, Json,
};
use storefront_store::OrderDetail;

use crate::middleware::RequestId;

use super::{map_catalog_error, not_found, ApiError, ApiResponse, AppState};

/// Order lines keep their checkout price; `product` is null for products
/// that have since been deleted.
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OrderDetail>>, ApiError> {
    let detail = state
        .catalog
        .order_detail(&id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone(), "order", &id))?;

    Ok(Json(ApiResponse::new(detail, req_id.0)))
}
