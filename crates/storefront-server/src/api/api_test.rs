use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use storefront_core::load_catalog;
use storefront_store::{seed_catalog, BatchLimit, BatchResolver, DocumentStore, MemoryStore};
use tower::ServiceExt;

use super::*;

async fn seeded_store() -> Arc<MemoryStore> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog.yaml");
    let catalog = load_catalog(&path).expect("sample catalog");
    let store = Arc::new(MemoryStore::new());
    seed_catalog(store.as_ref(), &catalog).await.expect("seed");
    store
}

fn app_with(store: Arc<MemoryStore>, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let dyn_store: Arc<dyn DocumentStore> = store;
    let catalog = Catalog::new(BatchResolver::new(dyn_store, BatchLimit::DEFAULT));
    build_app(AppState { catalog }, auth, rate_limit)
}

fn open_auth() -> AuthState {
    AuthState::from_keys("", true).expect("dev auth")
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn ids_of(values: &serde_json::Value) -> Vec<&str> {
    values
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v["id"].as_str().expect("id"))
        .collect()
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(-5)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("store_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_store_backend() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["backend"], "memory");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(&b"req-abc"[..])
    );
}

#[tokio::test]
async fn products_list_excludes_inactive() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/products?limit=100").await;

    assert_eq!(status, StatusCode::OK);
    let ids = ids_of(&json["data"]);
    assert_eq!(ids.len(), 6);
    assert!(!ids.contains(&"retired-sandal"));
}

#[tokio::test]
async fn product_detail_returns_related_in_curated_order() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/products/field-jacket").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["product"]["id"], "field-jacket");
    assert_eq!(
        ids_of(&json["data"]["related"]),
        vec!["wool-beanie", "linen-shirt"]
    );
}

#[tokio::test]
async fn unknown_product_is_404() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/products/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn homepage_sections_keep_editorial_order() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/home").await;

    assert_eq!(status, StatusCode::OK);
    let sections = json["data"].as_array().expect("sections");
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["section"]["id"], "new-arrivals");
    assert_eq!(
        ids_of(&sections[1]["products"]),
        vec!["linen-shirt", "chino-short", "canvas-tote"]
    );
}

#[tokio::test]
async fn resolve_ordered_repeats_duplicates_and_drops_missing() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(
        app,
        "/api/v1/resolve/products?ids=wool-beanie,ghost,canvas-tote,wool-beanie&ordered=true",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["requested"], 4);
    assert_eq!(
        ids_of(&json["data"]["documents"]),
        vec!["wool-beanie", "canvas-tote", "wool-beanie"]
    );
}

#[tokio::test]
async fn resolve_without_ids_issues_no_query() {
    let store = seeded_store().await;
    store.clear_queries().await;
    let app = app_with(store.clone(), open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/resolve/products").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["documents"].as_array().expect("docs").is_empty());
    assert!(store.queries().await.is_empty());
}

#[tokio::test]
async fn resolve_rejects_unknown_collection() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/resolve/customers?ids=a").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn unavailable_store_maps_to_503_without_details() {
    let store = seeded_store().await;
    store.fail_after(0);
    let app = app_with(store, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/resolve/products?ids=a,b").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "store_unavailable");
    assert_eq!(json["error"]["message"], "document store unavailable");
}

#[test]
fn decode_failures_map_to_internal_error() {
    let source = serde_json::from_str::<u8>("\"x\"").unwrap_err();
    let err = CatalogError::Decode {
        collection: "products".to_string(),
        id: "bad".to_string(),
        source,
    };
    let api_error = map_catalog_error("req-1".to_string(), &err);
    assert_eq!(api_error.error.code, "internal_error");
    assert!(!api_error.error.message.contains("bad"));
}

#[tokio::test]
async fn order_detail_keeps_lines_for_deleted_products() {
    let app = app_with(seeded_store().await, open_auth(), default_rate_limit_state());
    let (status, json) = get_json(app, "/api/v1/orders/order-1002").await;

    assert_eq!(status, StatusCode::OK);
    let lines = json["data"]["lines"].as_array().expect("lines");
    assert_eq!(lines.len(), 2);
    assert!(lines[1]["product"].is_null());
    assert_eq!(json["data"]["total"], "183.00");
}

#[tokio::test]
async fn overflowing_order_total_is_internal_error() {
    let store = seeded_store().await;
    let order = serde_json::json!({
        "items": [{
            "product_id": "linen-shirt",
            "quantity": 2,
            "unit_price": "79228162514264337593543950335"
        }]
    });
    let serde_json::Value::Object(fields) = order else {
        unreachable!("literal is an object")
    };
    store
        .put("orders", &storefront_store::Document::new("o-big", fields))
        .await
        .expect("put");
    let app = app_with(store, open_auth(), default_rate_limit_state());

    let (status, json) = get_json(app, "/api/v1/orders/o-big").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "internal_error");
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let auth = AuthState::from_keys("secret-key", false).expect("auth");
    let app = app_with(seeded_store().await, auth, default_rate_limit_state());

    let (status, json) = get_json(app.clone(), "/api/v1/orders/order-1001").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/orders/order-1001")
                .header("authorization", "Bearer secret-key")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // Public routes stay open.
    let (status, _) = get_json(app, "/api/v1/home").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_are_rate_limited() {
    let rate_limit = RateLimitState::new(1, Duration::from_secs(60));
    let app = app_with(seeded_store().await, open_auth(), rate_limit);

    let (first, _) = get_json(app.clone(), "/api/v1/orders/order-1001").await;
    let (second, json) = get_json(app, "/api/v1/orders/order-1001").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}
