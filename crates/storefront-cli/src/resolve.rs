use storefront_store::{Catalog, Document};

/// Resolve `ids` and print the matching documents as pretty JSON.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store cannot be opened,
/// or any batch query fails.
pub(crate) async fn run_resolve(
    collection: &str,
    ids: &[String],
    ordered: bool,
) -> anyhow::Result<()> {
    let config = storefront_core::load_app_config()?;
    let store = storefront_db::open_store(&config).await?;
    let catalog = Catalog::new(storefront_db::build_resolver(&config, store)?);

    let documents = catalog.resolve_records(collection, ids, ordered).await?;
    tracing::info!(
        collection,
        requested = ids.len(),
        returned = documents.len(),
        ordered,
        "resolved"
    );

    println!("{}", render_documents(&documents)?);
    Ok(())
}

pub(crate) fn render_documents(documents: &[Document]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(documents)?)
}
