use thiserror::Error;

// ---------------------------------------------------------------------------
// BatchFailure
// ---------------------------------------------------------------------------

/// One failed document in a bulk save, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Collection id when one was assigned, otherwise the draft name.
    pub key: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// CollectionError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("collection not found: {0}")]
    NotFound(String),

    #[error("no published version for collection: {0}")]
    VersionUnavailable(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("batch save partially failed: {} saved, {} failed", .saved.len(), .failed.len())]
    PartialBatch {
        saved: Vec<String>,
        failed: Vec<BatchFailure>,
    },

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CollectionError>;
