use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use storefront_store::{Document, DocumentStore, StoreError};

use crate::{ping, DbError};

const UPSERT_SQL: &str = "INSERT INTO documents (collection, id, data) \
     VALUES ($1, $2, $3) \
     ON CONFLICT (collection, id) DO UPDATE SET \
         data = EXCLUDED.data, \
         updated_at = NOW()";

/// A row from the `documents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub collection: String,
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    /// # Errors
    ///
    /// Returns [`DbError::MalformedData`] if `data` is not a JSON object.
    pub fn into_document(self) -> Result<Document, DbError> {
        match self.data {
            Value::Object(fields) => Ok(Document::new(self.id, fields)),
            _ => Err(DbError::MalformedData {
                collection: self.collection,
                id: self.id,
            }),
        }
    }
}

/// Fetch one document by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_document(
    pool: &PgPool,
    collection: &str,
    id: &str,
) -> Result<Option<DocumentRow>, DbError> {
    let row = sqlx::query_as::<_, DocumentRow>(
        "SELECT collection, id, data, created_at, updated_at \
         FROM documents WHERE collection = $1 AND id = $2",
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Fetch every document in `collection` whose id is in `ids`, in one query.
///
/// Unknown ids are skipped. Rows come back ordered by id, not by input position.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_documents(
    pool: &PgPool,
    collection: &str,
    ids: &[&str],
) -> Result<Vec<DocumentRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = ids.iter().map(|id| (*id).to_string()).collect();
    let rows = sqlx::query_as::<_, DocumentRow>(
        "SELECT collection, id, data, created_at, updated_at \
         FROM documents WHERE collection = $1 AND id = ANY($2) \
         ORDER BY id",
    )
    .bind(collection)
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// First `limit` documents of a collection in id order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_documents(
    pool: &PgPool,
    collection: &str,
    limit: usize,
) -> Result<Vec<DocumentRow>, DbError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = sqlx::query_as::<_, DocumentRow>(
        "SELECT collection, id, data, created_at, updated_at \
         FROM documents WHERE collection = $1 \
         ORDER BY id LIMIT $2",
    )
    .bind(collection)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Insert or replace a document's fields.
///
/// On conflict the stored fields are replaced wholesale and `updated_at` is
/// bumped; `created_at` keeps its original value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_document(
    pool: &PgPool,
    collection: &str,
    id: &str,
    fields: &Map<String, Value>,
) -> Result<(), DbError> {
    sqlx::query(UPSERT_SQL)
        .bind(collection)
        .bind(id)
        .bind(Json(fields))
        .execute(pool)
        .await?;
    Ok(())
}

/// Upsert many documents of one collection inside a single transaction.
///
/// Either every document is written or none is.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails.
pub async fn upsert_documents(
    pool: &PgPool,
    collection: &str,
    documents: &[Document],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    for document in documents {
        sqlx::query(UPSERT_SQL)
            .bind(collection)
            .bind(&document.id)
            .bind(Json(&document.fields))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(documents.len())
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::MalformedData { collection, id } => StoreError::MalformedDocument {
                name: format!("{collection}/{id}"),
                reason: "data column is not a JSON object".to_string(),
            },
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

/// [`DocumentStore`] over the Postgres `documents` table.
///
/// `get_many` is a single `id = ANY($2)` query, so it has no batch ceiling
/// of its own; the resolver's limit still bounds each group.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_documents(rows: Vec<DocumentRow>) -> Result<Vec<Document>, StoreError> {
    rows.into_iter()
        .map(|row| row.into_document().map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        match get_document(&self.pool, collection, id).await? {
            Some(row) => Ok(Some(row.into_document()?)),
            None => Ok(None),
        }
    }

    async fn get_many(&self, collection: &str, ids: &[&str]) -> Result<Vec<Document>, StoreError> {
        let rows = get_documents(&self.pool, collection, ids).await?;
        tracing::trace!(
            collection,
            requested = ids.len(),
            found = rows.len(),
            "pg get_many"
        );
        into_documents(rows)
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        into_documents(list_documents(&self.pool, collection, limit).await?)
    }

    async fn put(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        upsert_document(&self.pool, collection, &document.id, &document.fields).await?;
        Ok(())
    }

    async fn put_many(&self, collection: &str, documents: &[Document]) -> Result<(), StoreError> {
        let written = upsert_documents(&self.pool, collection, documents).await?;
        tracing::debug!(collection, written, "pg put_many committed");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        ping(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("postgres ping failed: {e}")))
    }
}
