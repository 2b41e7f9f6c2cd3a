/// Errors from store, collection, and backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists at the requested key.
    #[error("key not found in {collection}: {key}")]
    KeyNotFound { collection: String, key: String },

    /// A record already exists at the key a `create` targeted.
    #[error("key already exists in {collection}: {key}")]
    KeyAlreadyExists { collection: String, key: String },

    /// A stored payload could not be decoded into the collection's model.
    #[error(
        "failed to decode record {} in {collection}: {reason}",
        .key.as_deref().unwrap_or("<unknown key>")
    )]
    Decode {
        collection: String,
        key: Option<String>,
        reason: String,
    },

    /// A model could not be encoded for storage.
    #[error("failed to encode record for {collection}: {reason}")]
    Encode { collection: String, reason: String },

    /// The underlying engine reported an error.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write was attempted through a read-only transaction or environment.
    #[error("store is read-only")]
    ReadOnly,

    /// A state that correct callers can never reach.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl StoreError {
    /// Wrap any displayable engine error as a backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// Returns `true` for `KeyNotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    /// Returns `true` for `KeyAlreadyExists`.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::KeyAlreadyExists { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
