//! Document store backed by Firestore's REST API (v1).

mod value;

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use storefront_core::FirestoreConfig;

use crate::document::Document;
use crate::error::StoreError;
use crate::store::DocumentStore;

/// Maximum number of values Firestore accepts in one `IN` filter.
pub const FIRESTORE_IN_LIMIT: usize = 30;

/// Characters escaped when an identifier is used as a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    /// Absent on rows that only report progress (`readTime`).
    document: Option<RawDocument>,
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
}

/// Firestore REST client implementing [`DocumentStore`].
///
/// Every request is a single attempt bounded by the configured timeout;
/// retry policy belongs to callers.
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    /// `projects/{project}/databases/{database}`
    database_path: String,
    access_token: Option<String>,
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("base_url", &self.base_url)
            .field("database_path", &self.database_path)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .finish_non_exhaustive()
    }
}

impl FirestoreStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &FirestoreConfig, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            database_path: format!(
                "projects/{}/databases/{}",
                encode_segment(&config.project_id),
                encode_segment(&config.database)
            ),
            access_token: config.access_token.clone(),
        })
    }

    fn documents_url(&self) -> String {
        format!("{}/{}/documents", self.base_url, self.database_path)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url(),
            encode_segment(collection),
            encode_segment(id)
        )
    }

    /// Fully qualified resource name, as used by `referenceValue`.
    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database_path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn run_query_body(&self, collection: &str, ids: &[&str]) -> Value {
        let references: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "referenceValue": self.document_name(collection, id) }))
            .collect();
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "__name__" },
                        "op": "IN",
                        "value": { "arrayValue": { "values": references } }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &'static str {
        "firestore"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, id);
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument =
            read_json(response, &url, &format!("document {collection}/{id}")).await?;
        into_document(raw).map(Some)
    }

    async fn get_many(&self, collection: &str, ids: &[&str]) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > FIRESTORE_IN_LIMIT {
            return Err(StoreError::BatchTooLarge {
                requested: ids.len(),
                limit: FIRESTORE_IN_LIMIT,
            });
        }

        let url = format!("{}:runQuery", self.documents_url());
        let response = self
            .request(Method::POST, &url)
            .json(&self.run_query_body(collection, ids))
            .send()
            .await?;
        let rows: Vec<RunQueryRow> =
            read_json(response, &url, &format!("runQuery on {collection}")).await?;

        rows.into_iter()
            .filter_map(|row| row.document)
            .map(into_document)
            .collect()
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/{}", self.documents_url(), encode_segment(collection));
        let response = self
            .request(Method::GET, &url)
            .query(&[
                ("pageSize", limit.to_string()),
                ("orderBy", "__name__".to_string()),
            ])
            .send()
            .await?;
        let listed: ListDocumentsResponse =
            read_json(response, &url, &format!("list of {collection}")).await?;

        listed
            .documents
            .into_iter()
            .take(limit)
            .map(into_document)
            .collect()
    }

    async fn put(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        let url = self.document_url(collection, &document.id);
        let body = json!({ "fields": value::encode_fields(&document.fields) });
        let response = self
            .request(Method::PATCH, &url)
            .json(&body)
            .send()
            .await?;
        check_status(response.status(), &url)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let url = format!("{}:listCollectionIds", self.documents_url());
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "pageSize": 1 }))
            .send()
            .await?;
        check_status(response.status(), &url)
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn check_status(status: StatusCode, url: &str) -> Result<(), StoreError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::PermissionDenied {
            url: url.to_owned(),
        });
    }
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(StoreError::Unavailable(format!("{url} returned 503")));
    }
    if !status.is_success() {
        return Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    url: &str,
    context: &str,
) -> Result<T, StoreError> {
    check_status(response.status(), url)?;
    let body = response.text().await?;
    serde_json::from_str::<T>(&body).map_err(|e| StoreError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

fn into_document(raw: RawDocument) -> Result<Document, StoreError> {
    let id = raw.name.rsplit('/').next().unwrap_or_default().to_string();
    if id.is_empty() {
        return Err(StoreError::MalformedDocument {
            name: raw.name,
            reason: "resource name has no document id".to_string(),
        });
    }
    let fields = value::decode_fields(&raw.fields).map_err(|reason| {
        StoreError::MalformedDocument {
            name: raw.name.clone(),
            reason,
        }
    })?;
    Ok(Document::new(id, fields))
}
