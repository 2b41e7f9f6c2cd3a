use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::codec::{CodecConfig, SerdeCodec};
use crate::error::{StoreError, StoreResult};
use crate::traits::{KvBackend, KvTxn};

/// Registry of named collections bound to one backend.
///
/// Collections are opened lazily and kept for the store's lifetime. The store
/// also owns the one [`SerdeCodec`] that typed collections share unless they
/// are built with their own codec.
///
/// # Transactions
///
/// [`Store::read`] and [`Store::write`] open a backend transaction and hand it
/// to a block. The transaction is always passed explicitly from there: every
/// collection operation takes it as an argument and nothing looks it up from
/// ambient state. Opening a second transaction from inside a block is a
/// caller error: backends track open transactions per thread with
/// [`ActiveTxns`](crate::guard::ActiveTxns) and report
/// [`StoreError::InvariantViolation`], so a nested block never commits on its
/// own.
pub struct Store<B: KvBackend> {
    backend: B,
    collections: RwLock<HashMap<String, Arc<B::Collection>>>,
    codec: Arc<SerdeCodec>,
}

impl<B: KvBackend> Store<B> {
    /// Create a store using the default JSON codec.
    pub fn new(backend: B) -> Self {
        Self::with_codec(backend, CodecConfig::default())
    }

    /// Create a store whose shared codec is built from `config`.
    pub fn with_codec(backend: B, config: CodecConfig) -> Self {
        Self {
            backend,
            collections: RwLock::new(HashMap::new()),
            codec: Arc::new(SerdeCodec::new(config)),
        }
    }

    /// The backend this store was built on.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The store-wide codec.
    pub fn codec(&self) -> Arc<SerdeCodec> {
        Arc::clone(&self.codec)
    }

    /// Create the named collection if it does not exist yet.
    pub fn create_collection(&self, name: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().expect("lock poisoned");
        if collections.contains_key(name) {
            return Ok(());
        }
        let collection = self.backend.open_collection(name)?;
        debug!(collection = name, "opened collection");
        collections.insert(name.to_string(), Arc::new(collection));
        Ok(())
    }

    /// Look up a previously created collection.
    pub fn get_collection(&self, name: &str) -> Option<Arc<B::Collection>> {
        self.collections
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
    }

    /// Create-if-absent, then return the collection.
    pub fn open_collection(&self, name: &str) -> StoreResult<Arc<B::Collection>> {
        self.create_collection(name)?;
        self.get_collection(name).ok_or_else(|| {
            StoreError::InvariantViolation(format!("collection {name} missing after create"))
        })
    }

    /// Names of all registered collections, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Run `block` inside a read transaction.
    ///
    /// The transaction is always rolled back once `block` returns. Its result
    /// (or error) is passed through unchanged.
    pub fn read<R, E, F>(&self, block: F) -> Result<R, E>
    where
        E: From<StoreError>,
        F: FnOnce(&B::Txn<'_>) -> Result<R, E>,
    {
        let txn = self.backend.begin_read()?;
        debug!("read transaction opened");
        let result = block(&txn);
        txn.abort();
        debug!(ok = result.is_ok(), "read transaction closed");
        result
    }

    /// Run `block` inside a write transaction.
    ///
    /// Commits if `block` returns `Ok`; aborts and propagates the error
    /// otherwise. Triggers fired by writes inside the block share the same
    /// transaction, so their writes commit or roll back together with it.
    pub fn write<R, E, F>(&self, block: F) -> Result<R, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut B::Txn<'_>) -> Result<R, E>,
    {
        let mut txn = self.backend.begin_write()?;
        debug!("write transaction opened");
        match block(&mut txn) {
            Ok(value) => {
                txn.commit()?;
                debug!("write transaction committed");
                Ok(value)
            }
            Err(err) => {
                txn.abort();
                debug!("write transaction aborted");
                Err(err)
            }
        }
    }
}

impl<B: KvBackend + std::fmt::Debug> std::fmt::Debug for Store<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend)
            .field("collections", &self.collection_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::traits::KvCollection;

    fn store() -> Store<MemoryBackend> {
        Store::new(MemoryBackend::new())
    }

    // -----------------------------------------------------------------------
    // Collection registry
    // -----------------------------------------------------------------------

    #[test]
    fn create_collection_is_idempotent() {
        let store = store();
        store.create_collection("cards").unwrap();
        let first = store.get_collection("cards").unwrap();
        first.set("k", b"v", None).unwrap();

        store.create_collection("cards").unwrap();
        let second = store.get_collection("cards").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.get("k", None).unwrap().unwrap(), b"v");
    }

    #[test]
    fn get_unknown_collection_is_none() {
        assert!(store().get_collection("nope").is_none());
    }

    #[test]
    fn collection_names_sorted() {
        let store = store();
        store.create_collection("words").unwrap();
        store.create_collection("cards").unwrap();
        assert_eq!(store.collection_names(), vec!["cards", "words"]);
    }

    // -----------------------------------------------------------------------
    // read / write
    // -----------------------------------------------------------------------

    #[test]
    fn write_commits_on_ok() {
        let store = store();
        let docs = store.open_collection("docs").unwrap();
        let value = store
            .write(|txn| -> StoreResult<u32> {
                docs.set("a", b"1", Some(txn))?;
                Ok(7)
            })
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(docs.get("a", None).unwrap().unwrap(), b"1");
    }

    #[test]
    fn write_aborts_on_err() {
        let store = store();
        let docs = store.open_collection("docs").unwrap();
        let result = store.write(|txn| -> StoreResult<()> {
            docs.set("a", b"1", Some(txn))?;
            Err(StoreError::InvariantViolation("boom".into()))
        });
        assert!(matches!(result, Err(StoreError::InvariantViolation(_))));
        assert!(docs.get("a", None).unwrap().is_none());
    }

    #[derive(Debug)]
    enum AppError {
        Store(StoreError),
        Rejected,
    }

    impl From<StoreError> for AppError {
        fn from(err: StoreError) -> Self {
            Self::Store(err)
        }
    }

    #[test]
    fn write_aborts_on_caller_error_type() {
        let store = store();
        let docs = store.open_collection("docs").unwrap();
        let result: Result<(), AppError> = store.write(|txn| {
            docs.set("a", b"1", Some(txn))?;
            Err(AppError::Rejected)
        });
        assert!(matches!(result, Err(AppError::Rejected)));
        assert!(docs.get("a", None).unwrap().is_none());
    }

    #[test]
    fn read_returns_block_result() {
        let store = store();
        let docs = store.open_collection("docs").unwrap();
        docs.set("a", b"1", None).unwrap();
        let value = store
            .read(|txn| -> StoreResult<Option<Vec<u8>>> { docs.get("a", Some(txn)) })
            .unwrap();
        assert_eq!(value.unwrap(), b"1");
    }

    #[test]
    fn nested_write_is_rejected_and_outer_abort_wins() {
        let store = store();
        let docs = store.open_collection("docs").unwrap();

        let result: Result<(), AppError> = store.write(|txn| {
            docs.set("outer", b"1", Some(txn))?;
            store.write(|inner| docs.set("inner", b"2", Some(inner)))?;
            Ok(())
        });

        match result {
            Err(AppError::Store(err)) => {
                assert!(matches!(err, StoreError::InvariantViolation(_)))
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(docs.get("outer", None).unwrap().is_none());
        assert!(docs.get("inner", None).unwrap().is_none());
    }

    #[test]
    fn nested_read_is_rejected() {
        let store = store();
        let result = store.read(|_txn| store.read(|_inner| Ok::<_, StoreError>(())));
        assert!(matches!(result, Err(StoreError::InvariantViolation(_))));
        // The slot is released once the outer block returns.
        assert!(store.read(|_txn| Ok::<_, StoreError>(())).is_ok());
    }

    #[test]
    fn read_propagates_block_error() {
        let store = store();
        let result: Result<(), AppError> = store.read(|_txn| Err(AppError::Rejected));
        assert!(matches!(result, Err(AppError::Rejected)));
    }

    #[test]
    fn debug_lists_collections() {
        let store = store();
        store.create_collection("cards").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("Store"));
        assert!(debug.contains("cards"));
    }
}
