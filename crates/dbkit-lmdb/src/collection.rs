use std::ops::ControlFlow;
use std::sync::Arc;

use dbkit_store::{KvCollection, RawCursor, StoreError, StoreResult};
use lmdb::{Database, Environment, RwTransaction, Transaction};

use dbkit_store::guard::ActiveTxns;
use crate::store::LmdbBackend;
use crate::txn::{delete_value, open_cursor, put_value, read_value, LmdbTxn};

/// One named sub-database of an [`LmdbBackend`].
///
/// Operations called without a transaction open a short-lived one and commit
/// it before returning. Iteration follows LMDB's key order.
pub struct LmdbCollection {
    name: String,
    db: Database,
    env: Arc<Environment>,
    active: Arc<ActiveTxns>,
    read_only: bool,
}

impl LmdbCollection {
    pub(crate) fn new(
        name: &str,
        db: Database,
        env: Arc<Environment>,
        active: Arc<ActiveTxns>,
        read_only: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            db,
            env,
            active,
            read_only,
        }
    }

    fn ensure_writable(&self) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Run `op` in an auto-committed write transaction.
    fn auto_commit<T>(
        &self,
        op: impl FnOnce(&mut RwTransaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _slot = self.active.enter()?;
        let mut txn = self.env.begin_rw_txn().map_err(StoreError::backend)?;
        let value = op(&mut txn)?;
        txn.commit().map_err(StoreError::backend)?;
        Ok(value)
    }
}

impl KvCollection<LmdbBackend> for LmdbCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, txn: Option<&LmdbTxn<'_>>) -> StoreResult<Option<Vec<u8>>> {
        if let Some(txn) = txn {
            return txn.get(self.db, key);
        }
        let _slot = self.active.enter()?;
        let txn = self.env.begin_ro_txn().map_err(StoreError::backend)?;
        read_value(&txn, self.db, key)
    }

    fn set(&self, key: &str, data: &[u8], txn: Option<&mut LmdbTxn<'_>>) -> StoreResult<()> {
        self.ensure_writable()?;
        match txn {
            Some(txn) => put_value(txn.writer()?, self.db, key, data),
            None => self.auto_commit(|txn| put_value(txn, self.db, key, data)),
        }
    }

    fn delete(&self, key: &str, txn: Option<&mut LmdbTxn<'_>>) -> StoreResult<()> {
        self.ensure_writable()?;
        match txn {
            Some(txn) => delete_value(txn.writer()?, self.db, key),
            None => self.auto_commit(|txn| delete_value(txn, self.db, key)),
        }
    }

    fn iterate(
        &self,
        txn: Option<&LmdbTxn<'_>>,
        visitor: &mut dyn FnMut(&str, &[u8]) -> ControlFlow<()>,
    ) -> StoreResult<()> {
        match txn {
            Some(txn) => visit_all(txn.cursor(self.db)?, visitor),
            None => {
                let _slot = self.active.enter()?;
                let txn = self.env.begin_ro_txn().map_err(StoreError::backend)?;
                visit_all(open_cursor(&txn, self.db)?, visitor);
            }
        }
        Ok(())
    }

    fn cursor<'t>(&self, txn: &'t LmdbTxn<'_>) -> StoreResult<RawCursor<'t>> {
        txn.cursor(self.db)
    }

    fn clear(&self) -> StoreResult<()> {
        self.ensure_writable()?;
        self.auto_commit(|txn| txn.clear_db(self.db).map_err(StoreError::backend))
    }
}

fn visit_all(cursor: RawCursor<'_>, visitor: &mut dyn FnMut(&str, &[u8]) -> ControlFlow<()>) {
    for (key, data) in cursor {
        if visitor(&key, &data).is_break() {
            break;
        }
    }
}

impl std::fmt::Debug for LmdbCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbCollection")
            .field("name", &self.name)
            .finish()
    }
}
