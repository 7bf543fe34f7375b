//! Chunked batch-fetch of documents by id, with optional order-preserving
//! reassembly.
//!
//! Stores cap how many identifiers one "id IN (...)" query may carry. The
//! resolver collapses duplicates, splits the unique ids into groups no larger
//! than that cap, queries every group, and concatenates the results.
//!
//! **All-or-nothing semantics**: if any group query fails the whole call
//! fails and the documents already fetched by other groups are discarded.
//! Retries and backoff are the caller's concern.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;

use crate::document::Document;
use crate::error::StoreError;
use crate::store::DocumentStore;

/// Group queries allowed in flight for one resolution unless overridden.
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 4;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("batch limit must be at least 1")]
    InvalidBatchLimit,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Maximum number of distinct identifiers sent in one store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimit(NonZeroUsize);

impl BatchLimit {
    /// Firestore's ceiling for `in` filters.
    pub const DEFAULT: Self = match NonZeroUsize::new(30) {
        Some(limit) => Self(limit),
        None => unreachable!(),
    };

    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidBatchLimit`] when `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, ResolveError> {
        NonZeroUsize::new(limit)
            .map(Self)
            .ok_or(ResolveError::InvalidBatchLimit)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for BatchLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Drop repeated ids, keeping the first occurrence of each.
#[must_use]
pub fn dedupe_preserving_order<S: AsRef<str>>(ids: &[S]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .map(AsRef::as_ref)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Map `ids` (duplicates included) onto `documents` by id, dropping ids with
/// no matching document. Output order follows `ids`.
#[must_use]
pub fn reassemble<S: AsRef<str>>(ids: &[S], documents: &[Document]) -> Vec<Document> {
    let by_id: HashMap<&str, &Document> = documents.iter().map(|d| (d.id.as_str(), d)).collect();
    ids.iter()
        .filter_map(|id| by_id.get(id.as_ref()).map(|doc| (*doc).clone()))
        .collect()
}

/// Resolves identifier lists into documents against an injected store.
#[derive(Clone)]
pub struct BatchResolver {
    store: Arc<dyn DocumentStore>,
    batch_limit: BatchLimit,
    max_concurrent_queries: usize,
}

impl std::fmt::Debug for BatchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchResolver")
            .field("store", &self.store.name())
            .field("batch_limit", &self.batch_limit)
            .field("max_concurrent_queries", &self.max_concurrent_queries)
            .finish()
    }
}

impl BatchResolver {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, batch_limit: BatchLimit) -> Self {
        Self {
            store,
            batch_limit,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
        }
    }

    /// Bound the number of group queries in flight. Values below 1 become 1.
    #[must_use]
    pub fn with_max_concurrent_queries(mut self, max: usize) -> Self {
        self.max_concurrent_queries = max.max(1);
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    #[must_use]
    pub fn batch_limit(&self) -> BatchLimit {
        self.batch_limit
    }

    /// Fetch every document named in `ids`, at most one per unique id.
    ///
    /// Issues `ceil(unique / batch_limit)` queries; none for empty input.
    /// The result is unordered relative to `ids`; ids with no document are
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Store`] if any group query fails.
    pub async fn resolve<S>(
        &self,
        collection: &str,
        ids: &[S],
    ) -> Result<Vec<Document>, ResolveError>
    where
        S: AsRef<str> + Sync,
    {
        let unique = dedupe_preserving_order(ids);
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let groups: Vec<&[&str]> = unique.chunks(self.batch_limit.get()).collect();
        tracing::debug!(
            collection,
            requested = ids.len(),
            unique = unique.len(),
            groups = groups.len(),
            store = self.store.name(),
            "resolving documents"
        );

        let store = &self.store;
        let queries: Vec<futures::future::BoxFuture<'_, Result<Vec<Document>, StoreError>>> = groups
            .into_iter()
            .map(|group| -> futures::future::BoxFuture<'_, Result<Vec<Document>, StoreError>> {
                Box::pin(async move {
                    let documents = store.get_many(collection, group).await?;
                    Ok::<_, StoreError>(retain_requested(collection, group, documents))
                })
            })
            .collect();
        let batches: Vec<Vec<Document>> = stream::iter(queries)
            .buffered(self.max_concurrent_queries)
            .try_collect()
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    /// Like [`resolve`](Self::resolve), but the output follows `ids` exactly:
    /// unmatched ids are dropped and repeated ids repeat their document.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Store`] if any group query fails.
    pub async fn resolve_ordered<S>(
        &self,
        collection: &str,
        ids: &[S],
    ) -> Result<Vec<Document>, ResolveError>
    where
        S: AsRef<str> + Sync,
    {
        let documents = self.resolve(collection, ids).await?;
        Ok(reassemble(ids, &documents))
    }
}

/// Keep only documents the group asked for, one per id.
fn retain_requested(collection: &str, group: &[&str], documents: Vec<Document>) -> Vec<Document> {
    let returned = documents.len();
    let mut pending: HashSet<&str> = group.iter().copied().collect();
    let kept: Vec<Document> = documents
        .into_iter()
        .filter(|doc| pending.remove(doc.id.as_str()))
        .collect();

    if kept.len() < returned {
        tracing::warn!(
            collection,
            discarded = returned - kept.len(),
            "store returned documents outside the requested group"
        );
    }
    kept
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
