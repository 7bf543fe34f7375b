use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use storefront_core::{ORDERS_COLLECTION, PRODUCTS_COLLECTION, SECTIONS_COLLECTION};
use storefront_store::Document;

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

const KNOWN_COLLECTIONS: [&str; 3] = [PRODUCTS_COLLECTION, SECTIONS_COLLECTION, ORDERS_COLLECTION];

/// Upper bound on ids accepted in one request.
const MAX_IDS: usize = 500;

#[derive(Debug, Deserialize)]
pub(super) struct ResolveQuery {
    /// Comma-separated ids. Duplicates are allowed.
    pub ids: Option<String>,
    #[serde(default)]
    pub ordered: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ResolveData {
    collection: String,
    ordered: bool,
    requested: usize,
    documents: Vec<Document>,
}

fn parse_ids(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub(super) async fn resolve_records(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(collection): Path<String>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ApiResponse<ResolveData>>, ApiError> {
    if !KNOWN_COLLECTIONS.contains(&collection.as_str()) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!(
                "unknown collection '{collection}'; expected one of {}",
                KNOWN_COLLECTIONS.join(", ")
            ),
        ));
    }

    let ids = parse_ids(query.ids.as_deref());
    if ids.len() > MAX_IDS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("at most {MAX_IDS} ids per request, got {}", ids.len()),
        ));
    }

    let documents = state
        .catalog
        .resolve_records(&collection, &ids, query.ordered)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        ResolveData {
            collection,
            ordered: query.ordered,
            requested: ids.len(),
            documents,
        },
        req_id.0,
    )))
}
