use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::cursor::{RawCursor, RawEntry};
use crate::error::{StoreError, StoreResult};
use crate::guard::{ActiveTxns, ThreadSlot};
use crate::traits::{KvBackend, KvCollection, KvTxn};

/// In-memory, map-based backend.
///
/// Intended for tests and embedding. Iteration follows insertion order.
/// Transactions give atomicity through an undo log (an aborted write restores
/// the previous payloads) but no isolation: concurrent writers observe each
/// other immediately and must be serialized by the caller.
///
/// A thread may hold one transaction at a time. Opening a second one, or
/// calling a collection operation without a transaction while one is open,
/// fails with [`StoreError::InvariantViolation`].
///
/// [`KvCollection::clear`] is not transactional: it is refused on a thread
/// that holds a transaction, and a transaction open on another thread that
/// later aborts restores only the keys it wrote itself.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    active: Arc<ActiveTxns>,
}

impl MemoryBackend {
    /// Empty backend with no collections.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Records of one collection, ordered by first insertion.
#[derive(Debug, Default)]
struct Docs {
    next_seq: u64,
    by_key: HashMap<String, (u64, Vec<u8>)>,
    order: BTreeMap<u64, String>,
}

impl Docs {
    /// Insert or replace, returning the previous `(seq, payload)`.
    fn insert(&mut self, key: &str, data: Vec<u8>) -> Option<(u64, Vec<u8>)> {
        if let Some(slot) = self.by_key.get_mut(key) {
            let seq = slot.0;
            let previous = std::mem::replace(&mut slot.1, data);
            return Some((seq, previous));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        self.by_key.insert(key.to_string(), (seq, data));
        None
    }

    fn remove(&mut self, key: &str) -> Option<(u64, Vec<u8>)> {
        let removed = self.by_key.remove(key)?;
        self.order.remove(&removed.0);
        Some(removed)
    }

    /// Put a key back exactly as it was, including its position.
    fn restore(&mut self, key: String, previous: Option<(u64, Vec<u8>)>) {
        self.remove(&key);
        if let Some((seq, data)) = previous {
            self.order.insert(seq, key.clone());
            self.by_key.insert(key, (seq, data));
        }
    }

    fn snapshot(&self) -> Vec<RawEntry> {
        self.order
            .values()
            .filter_map(|key| {
                self.by_key
                    .get(key)
                    .map(|(_, data)| (key.clone(), data.clone()))
            })
            .collect()
    }

    fn clear(&mut self) {
        self.by_key.clear();
        self.order.clear();
    }
}

type SharedDocs = Arc<RwLock<Docs>>;

/// One named collection of a [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    docs: SharedDocs,
    active: Arc<ActiveTxns>,
}

impl MemoryCollection {
    fn new(name: &str, active: Arc<ActiveTxns>) -> Self {
        Self {
            name: name.to_string(),
            docs: Arc::new(RwLock::new(Docs::default())),
            active,
        }
    }

    /// Claim the thread's slot for an operation run without a transaction.
    fn implicit_slot(&self, txn: Option<&MemoryTxn<'_>>) -> StoreResult<Option<ThreadSlot>> {
        match txn {
            Some(_) => Ok(None),
            None => self.active.enter().map(Some),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.docs.read().expect("lock poisoned").by_key.len()
    }

    /// Returns `true` if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Transaction over a [`MemoryBackend`].
pub struct MemoryTxn<'b> {
    read_only: bool,
    undo: Vec<UndoEntry>,
    _slot: ThreadSlot,
    _backend: PhantomData<&'b MemoryBackend>,
}

struct UndoEntry {
    docs: SharedDocs,
    key: String,
    previous: Option<(u64, Vec<u8>)>,
}

impl MemoryTxn<'_> {
    fn new(read_only: bool, slot: ThreadSlot) -> Self {
        Self {
            read_only,
            undo: Vec::new(),
            _slot: slot,
            _backend: PhantomData,
        }
    }

    fn record(&mut self, docs: &SharedDocs, key: &str, previous: Option<(u64, Vec<u8>)>) {
        self.undo.push(UndoEntry {
            docs: Arc::clone(docs),
            key: key.to_string(),
            previous,
        });
    }

    fn rollback(&mut self) {
        while let Some(entry) = self.undo.pop() {
            entry
                .docs
                .write()
                .expect("lock poisoned")
                .restore(entry.key, entry.previous);
        }
    }
}

impl KvTxn for MemoryTxn<'_> {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn commit(mut self) -> StoreResult<()> {
        self.undo.clear();
        Ok(())
    }

    fn abort(self) {
        // Drop performs the rollback.
    }
}

impl Drop for MemoryTxn<'_> {
    fn drop(&mut self) {
        if !self.undo.is_empty() {
            debug!(writes = self.undo.len(), "rolling back memory transaction");
            self.rollback();
        }
    }
}

impl KvBackend for MemoryBackend {
    type Txn<'b> = MemoryTxn<'b>;
    type Collection = MemoryCollection;

    fn open_collection(&self, name: &str) -> StoreResult<MemoryCollection> {
        Ok(MemoryCollection::new(name, Arc::clone(&self.active)))
    }

    fn begin_read(&self) -> StoreResult<MemoryTxn<'_>> {
        Ok(MemoryTxn::new(true, self.active.enter()?))
    }

    fn begin_write(&self) -> StoreResult<MemoryTxn<'_>> {
        Ok(MemoryTxn::new(false, self.active.enter()?))
    }
}

impl KvCollection<MemoryBackend> for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, txn: Option<&MemoryTxn<'_>>) -> StoreResult<Option<Vec<u8>>> {
        let _slot = self.implicit_slot(txn)?;
        let docs = self.docs.read().expect("lock poisoned");
        Ok(docs.by_key.get(key).map(|(_, data)| data.clone()))
    }

    fn set(&self, key: &str, data: &[u8], txn: Option<&mut MemoryTxn<'_>>) -> StoreResult<()> {
        if txn.as_ref().is_some_and(|t| t.read_only) {
            return Err(StoreError::ReadOnly);
        }
        let _slot = self.implicit_slot(txn.as_deref())?;
        let previous = self
            .docs
            .write()
            .expect("lock poisoned")
            .insert(key, data.to_vec());
        if let Some(txn) = txn {
            txn.record(&self.docs, key, previous);
        }
        Ok(())
    }

    fn delete(&self, key: &str, txn: Option<&mut MemoryTxn<'_>>) -> StoreResult<()> {
        if txn.as_ref().is_some_and(|t| t.read_only) {
            return Err(StoreError::ReadOnly);
        }
        let _slot = self.implicit_slot(txn.as_deref())?;
        let previous = self.docs.write().expect("lock poisoned").remove(key);
        if let (Some(txn), Some(previous)) = (txn, previous) {
            txn.record(&self.docs, key, Some(previous));
        }
        Ok(())
    }

    fn iterate(
        &self,
        txn: Option<&MemoryTxn<'_>>,
        visitor: &mut dyn FnMut(&str, &[u8]) -> ControlFlow<()>,
    ) -> StoreResult<()> {
        let _slot = self.implicit_slot(txn)?;
        // Visit a snapshot so the visitor may write back into this collection.
        let entries = self.docs.read().expect("lock poisoned").snapshot();
        for (key, data) in &entries {
            if visitor(key, data).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn cursor<'t>(&self, _txn: &'t MemoryTxn<'_>) -> StoreResult<RawCursor<'t>> {
        let entries = self.docs.read().expect("lock poisoned").snapshot();
        Ok(RawCursor::new(entries.into_iter()))
    }

    fn clear(&self) -> StoreResult<()> {
        let _slot = self.active.enter()?;
        self.docs.write().expect("lock poisoned").clear();
        Ok(())
    }
}
