//! Backend capability traits.
//!
//! A backend is a byte-oriented key-value engine split into named
//! collections. Every collection operation accepts an optional transaction;
//! when one is supplied the operation must run inside it rather than opening
//! an implicit transaction of its own.

use std::ops::ControlFlow;

use crate::cursor::RawCursor;
use crate::error::StoreResult;

/// A transaction handle bound to one backend session.
///
/// Dropping a transaction without calling [`KvTxn::commit`] rolls it back.
pub trait KvTxn {
    /// Returns `true` if the transaction cannot perform writes.
    fn is_read_only(&self) -> bool;

    /// Make every write performed through this transaction durable.
    fn commit(self) -> StoreResult<()>;

    /// Discard every write performed through this transaction.
    fn abort(self);
}

/// A key-value engine that hands out named collections and transactions.
pub trait KvBackend: Sized + Send + Sync + 'static {
    /// Transaction type. Borrows the backend for as long as it is open.
    type Txn<'b>: KvTxn
    where
        Self: 'b;

    /// Collection type produced by [`KvBackend::open_collection`].
    type Collection: KvCollection<Self>;

    /// Open or create the named collection.
    ///
    /// Called at most once per name by [`crate::Store`].
    fn open_collection(&self, name: &str) -> StoreResult<Self::Collection>;

    /// Begin a read-only transaction.
    ///
    /// Fails with `InvariantViolation` if the calling thread already holds a
    /// transaction on this backend; see [`crate::guard`].
    fn begin_read(&self) -> StoreResult<Self::Txn<'_>>;

    /// Begin a read-write transaction. Same per-thread rule as `begin_read`.
    fn begin_write(&self) -> StoreResult<Self::Txn<'_>>;
}

/// Byte-oriented operations on one named collection.
///
/// Contracts shared by every implementation:
/// - `get` on an absent key returns `Ok(None)`.
/// - `delete` on an absent key is a no-op.
/// - `iterate` stops as soon as the visitor returns `ControlFlow::Break`.
/// - Iteration order is backend-defined.
pub trait KvCollection<B: KvBackend>: Send + Sync {
    /// The collection's name within its store.
    fn name(&self) -> &str;

    /// Read the payload stored at `key`.
    fn get(&self, key: &str, txn: Option<&B::Txn<'_>>) -> StoreResult<Option<Vec<u8>>>;

    /// Store `data` at `key`, replacing any previous payload.
    fn set(&self, key: &str, data: &[u8], txn: Option<&mut B::Txn<'_>>) -> StoreResult<()>;

    /// Remove the payload stored at `key`.
    fn delete(&self, key: &str, txn: Option<&mut B::Txn<'_>>) -> StoreResult<()>;

    /// Visit every record until the visitor breaks.
    fn iterate(
        &self,
        txn: Option<&B::Txn<'_>>,
        visitor: &mut dyn FnMut(&str, &[u8]) -> ControlFlow<()>,
    ) -> StoreResult<()>;

    /// Open a forward-only cursor that lives no longer than `txn`.
    fn cursor<'t>(&self, txn: &'t B::Txn<'_>) -> StoreResult<RawCursor<'t>>;

    /// Remove every record in the collection.
    fn clear(&self) -> StoreResult<()>;
}
