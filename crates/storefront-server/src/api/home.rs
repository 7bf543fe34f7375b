use axum::{extract::State, Extension, Json};
use storefront_store::HomepageSectionView;

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

pub(super) async fn get_homepage(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<HomepageSectionView>>>, ApiError> {
    let sections = state
        .catalog
        .homepage()
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(sections, req_id.0)))
}
