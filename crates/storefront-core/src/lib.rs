pub mod app_config;
pub mod catalog;
pub mod config;
pub mod records;

pub use app_config::{AppConfig, Environment, FirestoreConfig, StoreBackend};
pub use catalog::{load_catalog, CatalogFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    HomepageSection, Order, OrderItem, Product, ORDERS_COLLECTION, PRODUCTS_COLLECTION,
    SECTIONS_COLLECTION,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
