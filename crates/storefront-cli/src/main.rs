mod resolve;
mod seed;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Storefront document store command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a catalog YAML file into the configured document store
    Seed {
        /// Catalog file with `products`, `sections` and `orders` lists
        #[arg(long, default_value = "config/catalog.yaml")]
        file: PathBuf,

        /// Validate the file and print counts without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve ids from a collection and print the documents as JSON
    Resolve {
        collection: String,

        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,

        /// Return documents in input order, repeating duplicates
        #[arg(long)]
        ordered: bool,
    },
    /// Check that the configured document store is reachable
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // stdout carries command output; logs go to stderr.
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(std::env::var("STOREFRONT_LOG_LEVEL").unwrap_or_else(|_| "info".into()))
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Seed { file, dry_run } => seed::run_seed(&file, dry_run).await?,
        Commands::Resolve {
            collection,
            ids,
            ordered,
        } => resolve::run_resolve(&collection, &ids, ordered).await?,
        Commands::Health => run_health().await?,
    }

    Ok(())
}

async fn run_health() -> anyhow::Result<()> {
    let config = storefront_core::load_app_config()?;
    let store = storefront_db::open_store(&config).await?;
    store.health_check().await?;
    println!("{} store ok", store.name());
    Ok(())
}
