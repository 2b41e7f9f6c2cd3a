//! LMDB-backed transactional backend for dbkit stores.
//!
//! Provides [`LmdbBackend`], a [`KvBackend`](dbkit_store::KvBackend) where
//! every collection is a named LMDB sub-database.
//!
//! Key features:
//! - Snapshot-isolated read transactions, many at once
//! - A single active write transaction per environment
//! - Cursor iteration in key order, bounded by the transaction's lifetime
//! - Detection of a second transaction opened on a thread that already holds
//!   one, which LMDB would otherwise deadlock on

pub mod collection;
pub mod config;
pub mod store;
pub mod txn;

pub use collection::LmdbCollection;
pub use config::LmdbConfig;
pub use store::LmdbBackend;
pub use txn::LmdbTxn;
