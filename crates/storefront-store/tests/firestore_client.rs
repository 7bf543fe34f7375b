//! Integration tests for `FirestoreStore` against a local `wiremock` server.
//!
//! No real network traffic is made. The mock server stands in for the
//! Firestore REST endpoint; `FIRESTORE_BASE_URL`-style overrides point the
//! client at it.

use std::sync::Arc;

use serde_json::{json, Map};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_core::FirestoreConfig;
use storefront_store::{
    BatchLimit, BatchResolver, Document, DocumentStore, FirestoreStore, ResolveError, StoreError,
    FIRESTORE_IN_LIMIT,
};

const DOCUMENTS: &str = "/v1/projects/shop-test/databases/(default)/documents";
const NAME_PREFIX: &str = "projects/shop-test/databases/(default)/documents";

fn test_store(server: &MockServer, token: Option<&str>) -> FirestoreStore {
    let config = FirestoreConfig {
        project_id: "shop-test".to_string(),
        database: "(default)".to_string(),
        base_url: format!("{}/v1", server.uri()),
        access_token: token.map(ToString::to_string),
    };
    FirestoreStore::new(&config, 5).expect("failed to build test FirestoreStore")
}

fn product_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "name": format!("{NAME_PREFIX}/products/{id}"),
        "fields": {
            "name": { "stringValue": name },
            "price": { "stringValue": "12.00" },
            "related_product_ids": { "arrayValue": { "values": [
                { "stringValue": "other" }
            ] } }
        },
        "createTime": "2026-01-01T00:00:00Z",
        "updateTime": "2026-01-01T00:00:00Z"
    })
}

// ---------------------------------------------------------------------------
// get
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_decodes_typed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/products/mug")))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json("mug", "Mug")))
        .mount(&server)
        .await;

    let store = test_store(&server, Some("test-token"));
    let doc = store
        .get("products", "mug")
        .await
        .expect("get should succeed")
        .expect("document should exist");

    assert_eq!(doc.id, "mug");
    assert_eq!(doc.fields["name"], "Mug");
    assert_eq!(doc.fields["related_product_ids"], json!(["other"]));
}

#[tokio::test]
async fn get_returns_none_on_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/products/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let result = store.get("products", "missing").await;
    assert!(matches!(result, Ok(None)), "expected Ok(None), got: {result:?}");
}

#[tokio::test]
async fn get_maps_403_to_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let result = store.get("products", "mug").await;
    assert!(
        matches!(result, Err(StoreError::PermissionDenied { .. })),
        "expected PermissionDenied, got: {result:?}"
    );
}

#[tokio::test]
async fn get_reports_invalid_json_as_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let result = store.get("products", "mug").await;
    assert!(
        matches!(result, Err(StoreError::Deserialize { .. })),
        "expected Deserialize, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// get_many (runQuery)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_many_sends_in_filter_and_skips_empty_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "products" }],
                "where": { "fieldFilter": {
                    "field": { "fieldPath": "__name__" },
                    "op": "IN"
                } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "document": product_json("a", "Alpha"), "readTime": "2026-01-01T00:00:00Z" },
            { "document": product_json("c", "Gamma"), "readTime": "2026-01-01T00:00:00Z" },
            { "readTime": "2026-01-01T00:00:00Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let docs = store
        .get_many("products", &["a", "b", "c"])
        .await
        .expect("runQuery should succeed");

    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn get_many_with_no_ids_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let docs = store.get_many("products", &[]).await.expect("empty ok");
    assert!(docs.is_empty());
}

#[tokio::test]
async fn get_many_rejects_oversized_batches() {
    let server = MockServer::start().await;
    let store = test_store(&server, None);
    let ids: Vec<String> = (0..=FIRESTORE_IN_LIMIT).map(|i| format!("p{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let result = store.get_many("products", &refs).await;
    assert!(
        matches!(
            result,
            Err(StoreError::BatchTooLarge { requested, limit }) if requested == 31 && limit == 30
        ),
        "expected BatchTooLarge, got: {result:?}"
    );
}

#[tokio::test]
async fn get_many_maps_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let result = store.get_many("products", &["a"]).await;
    assert!(
        matches!(result, Err(StoreError::UnexpectedStatus { status: 500, .. })),
        "expected UnexpectedStatus(500), got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// resolver over Firestore
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolver_splits_forty_five_ids_into_two_run_queries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let store: Arc<dyn DocumentStore> = Arc::new(test_store(&server, None));
    let resolver = BatchResolver::new(store, BatchLimit::DEFAULT);
    let ids: Vec<String> = (0..45).map(|i| format!("p{i}")).collect();

    let docs = resolver.resolve("products", &ids).await.expect("resolve");
    assert!(docs.is_empty());
}

#[tokio::test]
async fn resolver_fails_whole_call_when_store_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store: Arc<dyn DocumentStore> = Arc::new(test_store(&server, None));
    let resolver = BatchResolver::new(store, BatchLimit::DEFAULT);

    let result = resolver.resolve_ordered("products", &["a", "b"]).await;
    assert!(
        matches!(result, Err(ResolveError::Store(StoreError::Unavailable(_)))),
        "expected Unavailable, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// list / put / health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_orders_by_name_and_respects_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/sections")))
        .and(query_param("pageSize", "2"))
        .and(query_param("orderBy", "__name__"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                { "name": format!("{NAME_PREFIX}/sections/a"), "fields": {
                    "title": { "stringValue": "A" }
                } },
                { "name": format!("{NAME_PREFIX}/sections/b"), "fields": {
                    "title": { "stringValue": "B" }
                } }
            ]
        })))
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let docs = store.list("sections", 2).await.expect("list");
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn list_of_empty_collection_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/orders")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    assert!(store.list("orders", 10).await.expect("list").is_empty());
}

#[tokio::test]
async fn put_patches_encoded_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/products/mug")))
        .and(body_partial_json(json!({
            "fields": {
                "name": { "stringValue": "Mug" },
                "stock": { "integerValue": "3" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json("mug", "Mug")))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let mut fields = Map::new();
    fields.insert("name".to_string(), json!("Mug"));
    fields.insert("stock".to_string(), json!(3));
    store
        .put("products", &Document::new("mug", fields))
        .await
        .expect("put should succeed");
}

#[tokio::test]
async fn health_check_lists_collection_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:listCollectionIds")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collectionIds": ["products"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    store.health_check().await.expect("healthy");
}

#[tokio::test]
async fn health_check_fails_on_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = test_store(&server, None);
    let result = store.health_check().await;
    assert!(matches!(result, Err(StoreError::PermissionDenied { .. })));
}
