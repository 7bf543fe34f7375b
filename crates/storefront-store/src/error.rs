use thiserror::Error;

/// Errors returned by [`DocumentStore`](crate::DocumentStore) backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A document was readable but its contents did not follow the store's format.
    #[error("malformed document {name}: {reason}")]
    MalformedDocument { name: String, reason: String },

    #[error("permission denied by store at {url}")]
    PermissionDenied { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The caller asked for more identifiers than the backend accepts in one query.
    #[error("batch of {requested} identifiers exceeds the store limit of {limit}")]
    BatchTooLarge { requested: usize, limit: usize },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Failure inside a non-HTTP backend (e.g. a database driver).
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}
