use dbkit_crypto::CryptoError;
use thiserror::Error;

/// Errors from large-object storage.
#[derive(Debug, Error)]
pub enum BlobError {
    /// No object is stored under the key.
    #[error("object not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    /// The key cannot be used as a file name.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// Sealing failed, or a stored object did not authenticate.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Filesystem error while reading or writing an object.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    /// Returns `true` for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience result type for large-object operations.
pub type BlobResult<T> = Result<T, BlobError>;
