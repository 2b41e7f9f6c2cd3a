use thiserror::Error;

/// Errors from key handling, sealing, and hashing.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key was rejected by the cipher.
    #[error("invalid key material")]
    InvalidKey,

    /// The system RNG could not produce a nonce.
    #[error("random number generation failed")]
    Rng,

    /// The cipher refused to seal the payload.
    #[error("sealing failed")]
    SealFailed,

    /// Wrong key, tampered payload, or mismatched associated data.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Input shorter than a nonce plus a tag.
    #[error("sealed payload too short: {len} bytes")]
    Truncated { len: usize },

    /// Hex text that is not a 32-byte digest.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// I/O error while hashing a file or reader.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
