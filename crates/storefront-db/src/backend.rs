//! Builds the document store selected by `STOREFRONT_STORE_BACKEND`.

use std::sync::Arc;

use storefront_core::{load_catalog, AppConfig, ConfigError, StoreBackend};
use storefront_store::{
    seed_catalog, BatchLimit, BatchResolver, CatalogError, DocumentStore, FirestoreStore,
    MemoryStore, ResolveError, StoreError, FIRESTORE_IN_LIMIT,
};
use thiserror::Error;

use crate::{connect_pool_from_config, run_migrations, DbError, PgDocumentStore};

#[derive(Debug, Error)]
pub enum OpenStoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to seed memory store: {0}")]
    Seed(#[from] CatalogError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("store backend is firestore but FIRESTORE_PROJECT_ID is not configured")]
    MissingFirestoreConfig,
}

/// Open the configured backend.
///
/// Postgres has pending migrations applied before it is returned. The memory
/// backend starts empty unless `seed_path` names a catalog file.
///
/// # Errors
///
/// Returns [`OpenStoreError`] if the backend cannot be reached or built, or
/// if the seed file fails to load.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, OpenStoreError> {
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Memory => {
            let store = MemoryStore::new();
            if let Some(path) = &config.seed_path {
                let catalog = load_catalog(path)?;
                seed_catalog(&store, &catalog).await?;
            }
            Arc::new(store)
        }
        StoreBackend::Postgres => {
            let pool = connect_pool_from_config(config).await?;
            let applied = run_migrations(&pool).await.map_err(DbError::from)?;
            tracing::info!(applied, "database migrations up to date");
            Arc::new(PgDocumentStore::new(pool))
        }
        StoreBackend::Firestore => {
            let firestore = config
                .firestore
                .as_ref()
                .ok_or(OpenStoreError::MissingFirestoreConfig)?;
            Arc::new(FirestoreStore::new(firestore, config.store_timeout_secs)?)
        }
    };

    tracing::info!(store = store.name(), "document store ready");
    Ok(store)
}

/// Largest group a backend accepts in one `get_many`, if it has a ceiling.
fn backend_batch_ceiling(backend: StoreBackend) -> Option<usize> {
    match backend {
        StoreBackend::Firestore => Some(FIRESTORE_IN_LIMIT),
        StoreBackend::Memory | StoreBackend::Postgres => None,
    }
}

/// A resolver over `store` using the configured batch limit and concurrency.
///
/// # Errors
///
/// Returns [`OpenStoreError::Config`] if `STOREFRONT_BATCH_LIMIT` exceeds
/// what the configured backend accepts per query, or
/// [`OpenStoreError::Resolve`] if the limit is zero.
pub fn build_resolver(
    config: &AppConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<BatchResolver, OpenStoreError> {
    if let Some(ceiling) = backend_batch_ceiling(config.store_backend) {
        if config.batch_limit > ceiling {
            return Err(ConfigError::InvalidEnvVar {
                var: "STOREFRONT_BATCH_LIMIT".to_string(),
                reason: format!(
                    "{} exceeds the {} backend limit of {ceiling} ids per query",
                    config.batch_limit, config.store_backend
                ),
            }
            .into());
        }
    }

    let limit = BatchLimit::new(config.batch_limit)?;
    Ok(BatchResolver::new(store, limit).with_max_concurrent_queries(config.resolve_concurrency))
}
