use dbkit_store::{KvTxn, RawCursor, RawEntry, StoreError, StoreResult};
use lmdb::{Cursor, Database, Iter, RoCursor, RoTransaction, RwTransaction, Transaction, WriteFlags};
use tracing::warn;

use dbkit_store::guard::ThreadSlot;

/// Transaction over an [`LmdbBackend`](crate::LmdbBackend).
///
/// Read transactions see a consistent snapshot taken when they began. Only one
/// write transaction is active per environment at a time; others block in
/// `begin_write` until it finishes. Dropping the handle aborts it.
pub struct LmdbTxn<'env> {
    kind: TxnKind<'env>,
    // Released after `kind` is dropped (field order).
    _slot: ThreadSlot,
}

enum TxnKind<'env> {
    Read(RoTransaction<'env>),
    Write(RwTransaction<'env>),
}

impl<'env> LmdbTxn<'env> {
    pub(crate) fn read(txn: RoTransaction<'env>, slot: ThreadSlot) -> Self {
        Self {
            kind: TxnKind::Read(txn),
            _slot: slot,
        }
    }

    pub(crate) fn write(txn: RwTransaction<'env>, slot: ThreadSlot) -> Self {
        Self {
            kind: TxnKind::Write(txn),
            _slot: slot,
        }
    }

    pub(crate) fn get(&self, db: Database, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match &self.kind {
            TxnKind::Read(txn) => read_value(txn, db, key),
            TxnKind::Write(txn) => read_value(txn, db, key),
        }
    }

    pub(crate) fn writer(&mut self) -> StoreResult<&mut RwTransaction<'env>> {
        match &mut self.kind {
            TxnKind::Write(txn) => Ok(txn),
            TxnKind::Read(_) => Err(StoreError::ReadOnly),
        }
    }

    pub(crate) fn cursor(&self, db: Database) -> StoreResult<RawCursor<'_>> {
        match &self.kind {
            TxnKind::Read(txn) => open_cursor(txn, db),
            TxnKind::Write(txn) => open_cursor(txn, db),
        }
    }
}

impl KvTxn for LmdbTxn<'_> {
    fn is_read_only(&self) -> bool {
        matches!(self.kind, TxnKind::Read(_))
    }

    fn commit(self) -> StoreResult<()> {
        let committed = match self.kind {
            TxnKind::Read(txn) => txn.commit(),
            TxnKind::Write(txn) => txn.commit(),
        };
        committed.map_err(StoreError::backend)
    }

    fn abort(self) {
        match self.kind {
            TxnKind::Read(txn) => txn.abort(),
            TxnKind::Write(txn) => txn.abort(),
        }
    }
}

pub(crate) fn read_value<T: Transaction>(
    txn: &T,
    db: Database,
    key: &str,
) -> StoreResult<Option<Vec<u8>>> {
    match txn.get(db, &key) {
        Ok(bytes) => Ok(Some(bytes.to_vec())),
        Err(lmdb::Error::NotFound) => Ok(None),
        Err(e) => Err(StoreError::backend(e)),
    }
}

pub(crate) fn put_value(
    txn: &mut RwTransaction<'_>,
    db: Database,
    key: &str,
    data: &[u8],
) -> StoreResult<()> {
    txn.put(db, &key, &data, WriteFlags::empty())
        .map_err(StoreError::backend)
}

pub(crate) fn delete_value(txn: &mut RwTransaction<'_>, db: Database, key: &str) -> StoreResult<()> {
    match txn.del(db, &key, None) {
        Ok(()) | Err(lmdb::Error::NotFound) => Ok(()),
        Err(e) => Err(StoreError::backend(e)),
    }
}

pub(crate) fn open_cursor<T: Transaction>(txn: &T, db: Database) -> StoreResult<RawCursor<'_>> {
    let mut cursor = txn.open_ro_cursor(db).map_err(StoreError::backend)?;
    let iter = cursor.iter_start();
    Ok(RawCursor::new(CursorEntries {
        iter,
        _cursor: cursor,
    }))
}

/// Owns an LMDB cursor together with the iterator reading from it.
struct CursorEntries<'t> {
    iter: Iter<'t>,
    // Closed after `iter` is dropped (field order).
    _cursor: RoCursor<'t>,
}

impl Iterator for CursorEntries<'_> {
    type Item = RawEntry;

    fn next(&mut self) -> Option<Self::Item> {
        for (key, value) in self.iter.by_ref() {
            match std::str::from_utf8(key) {
                Ok(key) => return Some((key.to_string(), value.to_vec())),
                Err(_) => warn!(key = ?key, "skipping record with non-UTF-8 key"),
            }
        }
        None
    }
}
