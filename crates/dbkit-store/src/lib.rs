//! Typed document collections over pluggable key-value backends.
//!
//! A [`Store`] binds a [`KvBackend`] to a registry of named collections. On
//! top of the byte-oriented [`KvCollection`] contract, [`Collection`] adds
//! key derivation, serialization, guarded create/update semantics, and
//! after-set triggers that run inside the caller's transaction. [`Index`] is a
//! string-keyed collection meant to be maintained from those triggers.
//!
//! # Backends
//!
//! - [`MemoryBackend`] -- map-based backend for tests and embedding
//! - `dbkit-lmdb` -- disk-based transactional backend
//!
//! # Design Rules
//!
//! 1. Transactions are passed explicitly; no operation infers one, and a
//!    thread holding one cannot open another.
//! 2. Triggers fire in registration order, after the primary write, inside
//!    the same transaction.
//! 3. Bulk scans skip records that fail to decode and report them; single-key
//!    reads surface decode errors.
//! 4. Cursors borrow the transaction that produced them.

pub mod codec;
pub mod collection;
pub mod cursor;
pub mod error;
pub mod guard;
pub mod index;
pub mod memory;
pub mod store;
pub mod traits;

pub use codec::{CodecConfig, CodecError, CodecFormat, ModelCodec, SerdeCodec};
pub use collection::{AfterSetTrigger, Collection, KeyFn, ScanReport, SkippedRecord};
pub use cursor::{Documents, RawCursor, RawEntry, Records};
pub use error::{StoreError, StoreResult};
pub use guard::{ActiveTxns, ThreadSlot};
pub use index::Index;
pub use memory::{MemoryBackend, MemoryCollection, MemoryTxn};
pub use store::Store;
pub use traits::{KvBackend, KvCollection, KvTxn};
