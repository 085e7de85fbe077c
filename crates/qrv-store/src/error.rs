/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store container was written by an unknown schema version.
    #[error("unsupported store version {found} (this build supports {supported})")]
    VersionMismatch { found: String, supported: u32 },

    /// The id cannot be used as a storage key.
    #[error("invalid storage id: {0:?}")]
    InvalidId(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
