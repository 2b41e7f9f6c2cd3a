//! Cryptographic helpers for dbkit large-object storage.
//!
//! Provides password-derived symmetric keys, ChaCha20-Poly1305 sealing of
//! whole payloads, and BLAKE3 content hashes used as content-addressed keys.
//!
//! All primitives come from `blake3` and `ring`; nothing here implements a
//! cipher or hash of its own.

pub mod cipher;
pub mod error;
pub mod hasher;
pub mod key;

pub use cipher::Cipher;
pub use error::{CryptoError, CryptoResult};
pub use hasher::ContentHash;
pub use key::EncryptionKey;
