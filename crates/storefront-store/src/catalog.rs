//! Page-data loaders for the storefront.
//!
//! Each loader reads its source record, collects the identifiers it
//! references, and hydrates them through the [`BatchResolver`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_core::{
    CatalogFile, HomepageSection, Order, OrderItem, Product, ORDERS_COLLECTION,
    PRODUCTS_COLLECTION, SECTIONS_COLLECTION,
};
use thiserror::Error;

use crate::document::Document;
use crate::error::StoreError;
use crate::resolver::{reassemble, BatchResolver, ResolveError};
use crate::store::DocumentStore;

/// Upper bound on homepage sections read per page load.
const MAX_SECTIONS: usize = 50;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("document {collection}/{id} does not match the expected shape: {source}")]
    Decode {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("record could not be encoded as a document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("order {order_id} total overflows the decimal range")]
    TotalOverflow { order_id: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    /// Active related products in curated order.
    pub related: Vec<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomepageSectionView {
    pub section: HomepageSection,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub item: OrderItem,
    /// `None` once the product has been deleted from the catalog.
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub products: usize,
    pub sections: usize,
    pub orders: usize,
}

/// Storefront read paths over an injected store.
#[derive(Debug, Clone)]
pub struct Catalog {
    resolver: BatchResolver,
}

impl Catalog {
    #[must_use]
    pub fn new(resolver: BatchResolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn resolver(&self) -> &BatchResolver {
        &self.resolver
    }

    fn store(&self) -> &dyn DocumentStore {
        self.resolver.store().as_ref()
    }

    /// Active products, ordered by id. Inactive products count against `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the store fails or a product does not decode.
    pub async fn list_products(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        let documents = self.store().list(PRODUCTS_COLLECTION, limit).await?;
        let products = decode_all::<Product>(PRODUCTS_COLLECTION, &documents)?;
        Ok(products.into_iter().filter(|p| p.active).collect())
    }

    /// A product with its related products hydrated in curated order.
    ///
    /// Self-references and inactive related products are left out. Returns
    /// `Ok(None)` when no product has this id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if any store query fails or a record does not decode.
    pub async fn product_detail(&self, id: &str) -> Result<Option<ProductDetail>, CatalogError> {
        let Some(document) = self.store().get(PRODUCTS_COLLECTION, id).await? else {
            return Ok(None);
        };
        let product: Product = decode(PRODUCTS_COLLECTION, &document)?;

        let related_ids: Vec<&str> = product
            .related_product_ids
            .iter()
            .map(String::as_str)
            .filter(|related| *related != product.id)
            .collect();
        let related_documents = self
            .resolver
            .resolve_ordered(PRODUCTS_COLLECTION, &related_ids)
            .await?;
        let related = decode_all::<Product>(PRODUCTS_COLLECTION, &related_documents)?
            .into_iter()
            .filter(|p| p.active)
            .collect();

        tracing::debug!(
            product_id = %product.id,
            requested = related_ids.len(),
            "loaded product detail"
        );

        Ok(Some(ProductDetail { product, related }))
    }

    /// Homepage sections sorted by `position`, each with its active products
    /// in editorial order.
    ///
    /// Product ids from every section are resolved together so shared
    /// products are fetched once.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if any store query fails or a record does not decode.
    pub async fn homepage(&self) -> Result<Vec<HomepageSectionView>, CatalogError> {
        let documents = self.store().list(SECTIONS_COLLECTION, MAX_SECTIONS).await?;
        let mut sections = decode_all::<HomepageSection>(SECTIONS_COLLECTION, &documents)?;
        sections.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));

        let all_ids: Vec<&str> = sections
            .iter()
            .flat_map(|s| s.product_ids.iter().map(String::as_str))
            .collect();
        let product_documents = self
            .resolver
            .resolve(PRODUCTS_COLLECTION, &all_ids)
            .await?;

        sections
            .into_iter()
            .map(|section| {
                let ordered = reassemble(&section.product_ids, &product_documents);
                let products = decode_all::<Product>(PRODUCTS_COLLECTION, &ordered)?
                    .into_iter()
                    .filter(|p| p.active)
                    .collect();
                Ok(HomepageSectionView { section, products })
            })
            .collect()
    }

    /// An order joined with the current catalog entry for each line item.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if any store query fails, a record does not
    /// decode, or the order total overflows.
    pub async fn order_detail(&self, id: &str) -> Result<Option<OrderDetail>, CatalogError> {
        let Some(document) = self.store().get(ORDERS_COLLECTION, id).await? else {
            return Ok(None);
        };
        let order: Order = decode(ORDERS_COLLECTION, &document)?;

        let product_documents = self
            .resolver
            .resolve(PRODUCTS_COLLECTION, &order.product_ids())
            .await?;
        let products: HashMap<String, Product> =
            decode_all::<Product>(PRODUCTS_COLLECTION, &product_documents)?
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect();

        let lines = order
            .items
            .iter()
            .map(|item| OrderLine {
                item: item.clone(),
                product: products.get(&item.product_id).cloned(),
            })
            .collect();
        let total = order.total().ok_or_else(|| CatalogError::TotalOverflow {
            order_id: order.id.clone(),
        })?;

        Ok(Some(OrderDetail {
            order,
            lines,
            total,
        }))
    }

    /// Raw documents for `ids`, in input order when `ordered` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Resolve`] if any group query fails.
    pub async fn resolve_records(
        &self,
        collection: &str,
        ids: &[String],
        ordered: bool,
    ) -> Result<Vec<Document>, CatalogError> {
        let documents = if ordered {
            self.resolver.resolve_ordered(collection, ids).await?
        } else {
            self.resolver.resolve(collection, ids).await?
        };
        Ok(documents)
    }
}

/// Write every record of a catalog file into `store`.
///
/// # Errors
///
/// Returns [`CatalogError`] if a record cannot be encoded or a write fails.
/// Each collection is written with one `put_many`; collections written
/// before the failure stay written.
pub async fn seed_catalog(
    store: &dyn DocumentStore,
    catalog: &CatalogFile,
) -> Result<SeedSummary, CatalogError> {
    let products = put_all(store, PRODUCTS_COLLECTION, &catalog.products).await?;
    let sections = put_all(store, SECTIONS_COLLECTION, &catalog.sections).await?;
    let orders = put_all(store, ORDERS_COLLECTION, &catalog.orders).await?;

    let summary = SeedSummary {
        products,
        sections,
        orders,
    };
    tracing::info!(
        store = store.name(),
        products,
        sections,
        orders,
        "catalog seeded"
    );
    Ok(summary)
}

async fn put_all<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    records: &[T],
) -> Result<usize, CatalogError> {
    let documents = records
        .iter()
        .map(Document::from_record)
        .collect::<Result<Vec<_>, _>>()
        .map_err(CatalogError::Encode)?;
    store.put_many(collection, &documents).await?;
    Ok(documents.len())
}

fn decode<T: DeserializeOwned>(collection: &str, document: &Document) -> Result<T, CatalogError> {
    document.decode().map_err(|source| CatalogError::Decode {
        collection: collection.to_string(),
        id: document.id.clone(),
        source,
    })
}

fn decode_all<T: DeserializeOwned>(
    collection: &str,
    documents: &[Document],
) -> Result<Vec<T>, CatalogError> {
    documents.iter().map(|d| decode(collection, d)).collect()
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
