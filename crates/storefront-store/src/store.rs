use async_trait::async_trait;

use crate::document::Document;
use crate::error::StoreError;

/// Read/write access to a document database.
///
/// Handed to the resolver and the catalog as `Arc<dyn DocumentStore>` so
/// request handlers never reach for a process-wide client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs and health output.
    fn name(&self) -> &'static str;

    /// Fetch one document by id. A missing document is `Ok(None)`.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Fetch every document in `collection` whose id is one of `ids`.
    ///
    /// Result order is unspecified and missing ids are simply absent. Callers
    /// keep `ids` within the backend's per-query limit.
    async fn get_many(&self, collection: &str, ids: &[&str]) -> Result<Vec<Document>, StoreError>;

    /// Up to `limit` documents from `collection`, ordered by id.
    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError>;

    /// Create or replace a document.
    async fn put(&self, collection: &str, document: &Document) -> Result<(), StoreError>;

    /// Create or replace several documents of one collection.
    ///
    /// The default writes them one at a time, so a failure leaves earlier
    /// writes in place. Backends with transactions override this to write
    /// all or nothing.
    async fn put_many(&self, collection: &str, documents: &[Document]) -> Result<(), StoreError> {
        for document in documents {
            self.put(collection, document).await?;
        }
        Ok(())
    }

    /// Cheap round-trip proving the store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}
