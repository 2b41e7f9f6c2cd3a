//! Large-object storage for dbkit.
//!
//! A [`BlobStore`] keeps one directory per collection under a root directory
//! and one file per object. When opened with a password every payload is
//! sealed with ChaCha20-Poly1305 before it reaches disk and opened again on
//! download.
//!
//! Large-object writes are not atomic with writes to a key-value store. A
//! caller that uploads a blob and then records its key in a KV collection can
//! be left with an orphaned blob if the second write fails. Uploading under a
//! content hash ([`LargeObjectCollection::upload_content_addressed`]) keeps a
//! retry harmless.

pub mod collection;
pub mod config;
pub mod error;
pub mod store;

pub use collection::{BlobTxn, DirBlobCollection, LargeObjectCollection};
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use store::BlobStore;
