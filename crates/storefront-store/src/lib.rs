pub mod catalog;
pub mod document;
pub mod error;
pub mod firestore;
pub mod memory;
pub mod resolver;
pub mod store;

pub use catalog::{
    seed_catalog, Catalog, CatalogError, HomepageSectionView, OrderDetail, OrderLine,
    ProductDetail, SeedSummary,
};
pub use document::Document;
pub use error::StoreError;
pub use firestore::{FirestoreStore, FIRESTORE_IN_LIMIT};
pub use memory::{MemoryStore, RecordedQuery};
pub use resolver::{
    dedupe_preserving_order, reassemble, BatchLimit, BatchResolver, ResolveError,
    DEFAULT_MAX_CONCURRENT_QUERIES,
};
pub use store::DocumentStore;
