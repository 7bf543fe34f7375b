//! In-process document store for local development and tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::document::Document;
use crate::error::StoreError;
use crate::store::DocumentStore;

/// One `get_many` call as observed by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub collection: String,
    pub ids: Vec<String>,
}

/// `BTreeMap`-backed store that logs every batch query it serves.
///
/// `fail_after(n)` makes every `get_many` after the first `n` fail with
/// [`StoreError::Unavailable`], which lets tests exercise mid-resolution
/// failures.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Document>>>,
    queries: Mutex<Vec<RecordedQuery>>,
    successful_query_budget: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            queries: Mutex::new(Vec::new()),
            successful_query_budget: AtomicUsize::new(usize::MAX),
        }
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `n` more successful batch queries, then fail the rest.
    pub fn fail_after(&self, n: usize) {
        self.successful_query_budget.store(n, Ordering::SeqCst);
    }

    /// Batch queries served so far, in arrival order.
    pub async fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().await.clone()
    }

    pub async fn clear_queries(&self) {
        self.queries.lock().await.clear();
    }

    /// Number of documents stored in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn get_many(&self, collection: &str, ids: &[&str]) -> Result<Vec<Document>, StoreError> {
        {
            let mut queries = self.queries.lock().await;
            queries.push(RecordedQuery {
                collection: collection.to_string(),
                ids: ids.iter().map(|id| (*id).to_string()).collect(),
            });
            if queries.len() > self.successful_query_budget.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable(format!(
                    "memory store refused query #{} on {collection}",
                    queries.len()
                )));
            }
        }

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let wanted: HashSet<&str> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| docs.get(id).cloned())
            .collect())
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.values().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn put(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
