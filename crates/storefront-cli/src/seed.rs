use std::path::Path;

use storefront_core::{load_catalog, StoreBackend};
use storefront_store::SeedSummary;

/// Validate a catalog file and write its records to the configured store.
///
/// Records are upserted one by one; a failure part way through leaves the
/// records written so far in place, and rerunning the command is safe.
///
/// # Errors
///
/// Returns an error if the file fails validation, the store cannot be opened,
/// or a write fails.
pub(crate) async fn run_seed(file: &Path, dry_run: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(file)?;

    if dry_run {
        let summary = SeedSummary {
            products: catalog.products.len(),
            sections: catalog.sections.len(),
            orders: catalog.orders.len(),
        };
        println!("{} (dry run, nothing written)", format_summary(&summary));
        return Ok(());
    }

    let config = storefront_core::load_app_config()?;
    if config.store_backend == StoreBackend::Memory {
        tracing::warn!("memory backend selected; seeded records are discarded on exit");
    }

    let store = storefront_db::open_store(&config).await?;
    let summary = storefront_store::seed_catalog(store.as_ref(), &catalog).await?;
    println!("{} into {}", format_summary(&summary), store.name());
    Ok(())
}

pub(crate) fn format_summary(summary: &SeedSummary) -> String {
    format!(
        "seeded {} products, {} sections, {} orders",
        summary.products, summary.sections, summary.orders
    )
}
