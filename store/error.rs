use thiserror::Error;

/// Errors surfaced by the durable meta store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not connect to {uri}")]
    Connect {
        uri: String,
        #[source]
        source: sqlx::Error,
    },
    /// The referenced collection does not exist. During a migration batch
    /// this means the migration set is inconsistent with the target store,
    /// which is fatal and not retryable.
    #[error("collection {0:?} not found")]
    CollectionNotFound(String),
    /// Another batch holds the advisory lock. Callers may retry later; they
    /// must never block waiting for it.
    #[error("another migration batch holds the lock")]
    Locked,
    #[error("could not encode or decode a stored collection")]
    Encoding(#[from] serde_json::Error),
    /// Transient or permanent storage failure. Retried by the operator, not
    /// automatically: retry safety depends on the interrupted transform.
    #[error("storage failure")]
    Persistence(#[from] sqlx::Error),
}
