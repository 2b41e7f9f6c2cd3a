//! Typed CRUD layer over a backend collection.
//!
//! A [`Collection`] is parameterized by three strategies supplied at
//! construction: a key function deriving the record key from a model, and a
//! codec that encodes and decodes payloads. Writes made through `create`,
//! `update_one`, and `create_or_update_one` fire the collection's after-set
//! triggers, in registration order, before the call returns.
//!
//! # Atomicity
//!
//! With a transaction supplied, the primary write and every trigger write run
//! in that one transaction. Without one, each physical write auto-commits on
//! its own and the triggers run afterwards: a failing trigger propagates its
//! error but the primary write stays committed. Run writes inside
//! [`Store::write`] when derived state must stay consistent.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::codec::ModelCodec;
use crate::cursor::{Documents, Records};
use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use crate::traits::{KvBackend, KvCollection};

/// Derives a record key from a model.
pub type KeyFn<M> = dyn Fn(&M) -> String + Send + Sync;

/// Post-write callback: `(key, new_value, old_value, txn)`.
pub type AfterSetTrigger<B, M> = dyn Fn(&str, &M, Option<&M>, Option<&mut <B as KvBackend>::Txn<'_>>) -> StoreResult<()>
    + Send
    + Sync;

/// A record that a bulk scan passed over because it failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: String,
}

/// Outcome of [`Collection::find_with_report`].
#[derive(Debug, Clone)]
pub struct ScanReport<M> {
    /// Records that decoded and matched the predicate, in scan order.
    pub records: Vec<M>,
    /// Records excluded because their payload could not be decoded.
    pub skipped: Vec<SkippedRecord>,
}

/// Typed document collection.
pub struct Collection<B: KvBackend, M> {
    name: String,
    raw: Arc<B::Collection>,
    key_of: Arc<KeyFn<M>>,
    codec: Arc<dyn ModelCodec<M>>,
    triggers: Vec<Box<AfterSetTrigger<B, M>>>,
}

impl<B: KvBackend, M> Collection<B, M> {
    /// Open (creating if needed) the named collection using the store's
    /// shared codec.
    pub fn open<K>(store: &Store<B>, name: &str, key_of: K) -> StoreResult<Self>
    where
        M: Serialize + DeserializeOwned,
        K: Fn(&M) -> String + Send + Sync + 'static,
    {
        let codec: Arc<dyn ModelCodec<M>> = store.codec();
        Self::with_codec(store, name, key_of, codec)
    }

    /// Open the named collection with a caller-supplied codec.
    pub fn with_codec<K>(
        store: &Store<B>,
        name: &str,
        key_of: K,
        codec: Arc<dyn ModelCodec<M>>,
    ) -> StoreResult<Self>
    where
        K: Fn(&M) -> String + Send + Sync + 'static,
    {
        Ok(Self {
            name: name.to_string(),
            raw: store.open_collection(name)?,
            key_of: Arc::new(key_of),
            codec,
            triggers: Vec::new(),
        })
    }

    /// The collection's name within its store.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backend collection this typed view writes to.
    pub fn raw(&self) -> &Arc<B::Collection> {
        &self.raw
    }

    /// The key this collection stores `model` under.
    pub fn key_of(&self, model: &M) -> String {
        (self.key_of)(model)
    }

    fn encode(&self, model: &M) -> StoreResult<Vec<u8>> {
        self.codec.encode(model).map_err(|e| StoreError::Encode {
            collection: self.name.clone(),
            reason: e.0,
        })
    }

    fn decode(&self, key: &str, data: &[u8]) -> StoreResult<M> {
        self.codec.decode(data).map_err(|e| StoreError::Decode {
            collection: self.name.clone(),
            key: Some(key.to_string()),
            reason: e.0,
        })
    }

    // ---------------------------------------------------------------
    // Single-key access
    // ---------------------------------------------------------------

    /// Load and decode the record at `key`.
    pub fn get(&self, key: &str, txn: Option<&B::Txn<'_>>) -> StoreResult<Option<M>> {
        match self.raw.get(key, txn)? {
            Some(data) => self.decode(key, &data).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and store `value` at `key` without firing triggers.
    ///
    /// Low-level escape hatch: indexes maintained by triggers will not see
    /// this write.
    pub fn set(&self, key: &str, value: &M, txn: Option<&mut B::Txn<'_>>) -> StoreResult<()> {
        let data = self.encode(value)?;
        self.raw.set(key, &data, txn)
    }

    /// Remove the record at `key` without firing triggers.
    pub fn delete(&self, key: &str, txn: Option<&mut B::Txn<'_>>) -> StoreResult<()> {
        self.raw.delete(key, txn)
    }

    /// Load the record at `key`, failing with `KeyNotFound` if absent.
    pub fn find_by_key(&self, key: &str, txn: Option<&B::Txn<'_>>) -> StoreResult<M> {
        self.get(key, txn)?.ok_or_else(|| StoreError::KeyNotFound {
            collection: self.name.clone(),
            key: key.to_string(),
        })
    }

    // ---------------------------------------------------------------
    // Guarded writes
    // ---------------------------------------------------------------

    /// Register a trigger fired after every guarded write.
    ///
    /// Register triggers while building the collection, before sharing it.
    pub fn add_after_set_trigger<F>(&mut self, trigger: F)
    where
        F: Fn(&str, &M, Option<&M>, Option<&mut B::Txn<'_>>) -> StoreResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.triggers.push(Box::new(trigger));
    }

    /// Number of registered triggers.
    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    fn set_and_notify(
        &self,
        key: &str,
        value: &M,
        old: Option<M>,
        mut txn: Option<&mut B::Txn<'_>>,
    ) -> StoreResult<()> {
        let auto_commit = txn.is_none();
        self.set(key, value, txn.as_deref_mut())?;
        for (position, trigger) in self.triggers.iter().enumerate() {
            if let Err(err) = trigger(key, value, old.as_ref(), txn.as_deref_mut()) {
                if auto_commit {
                    warn!(
                        collection = %self.name,
                        key,
                        trigger = position,
                        error = %err,
                        "trigger failed after auto-committed write; primary write is not rolled back"
                    );
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Insert a new record. Fails with `KeyAlreadyExists` if the derived key
    /// is occupied. Triggers receive `old_value = None`.
    pub fn create(&self, model: &M, mut txn: Option<&mut B::Txn<'_>>) -> StoreResult<()> {
        let key = self.key_of(model);
        if self.raw.get(&key, txn.as_deref())?.is_some() {
            return Err(StoreError::KeyAlreadyExists {
                collection: self.name.clone(),
                key,
            });
        }
        self.set_and_notify(&key, model, None, txn.as_deref_mut())
    }

    /// Replace an existing record. Fails with `KeyNotFound` if the derived
    /// key is empty. Triggers receive the replaced value.
    pub fn update_one(&self, model: &M, mut txn: Option<&mut B::Txn<'_>>) -> StoreResult<()> {
        let key = self.key_of(model);
        let Some(old) = self.get(&key, txn.as_deref())? else {
            return Err(StoreError::KeyNotFound {
                collection: self.name.clone(),
                key,
            });
        };
        self.set_and_notify(&key, model, Some(old), txn.as_deref_mut())
    }

    /// Write unconditionally. Triggers receive whatever was stored before.
    pub fn create_or_update_one(
        &self,
        model: &M,
        mut txn: Option<&mut B::Txn<'_>>,
    ) -> StoreResult<()> {
        let key = self.key_of(model);
        let old = self.get(&key, txn.as_deref())?;
        self.set_and_notify(&key, model, old, txn.as_deref_mut())
    }

    // ---------------------------------------------------------------
    // Bulk access
    // ---------------------------------------------------------------

    /// Full scan returning every record that satisfies `predicate`.
    ///
    /// Records whose payload fails to decode are logged and excluded rather
    /// than failing the scan. Use [`Collection::find_with_report`] to see
    /// which ones.
    pub fn find<P>(&self, predicate: P, txn: Option<&B::Txn<'_>>) -> StoreResult<Vec<M>>
    where
        P: FnMut(&str, &M) -> bool,
    {
        Ok(self.find_with_report(predicate, txn)?.records)
    }

    /// Full scan returning matches together with the records it skipped.
    pub fn find_with_report<P>(
        &self,
        mut predicate: P,
        txn: Option<&B::Txn<'_>>,
    ) -> StoreResult<ScanReport<M>>
    where
        P: FnMut(&str, &M) -> bool,
    {
        let mut records = Vec::new();
        let mut skipped = Vec::new();
        self.raw.iterate(txn, &mut |key, data| {
            match self.codec.decode(data) {
                Ok(model) => {
                    if predicate(key, &model) {
                        records.push(model);
                    }
                }
                Err(err) => {
                    warn!(
                        collection = %self.name,
                        key,
                        error = %err,
                        "skipping undecodable record"
                    );
                    skipped.push(SkippedRecord {
                        key: key.to_string(),
                        reason: err.0,
                    });
                }
            }
            ControlFlow::Continue(())
        })?;
        Ok(ScanReport { records, skipped })
    }

    /// Lazy `(key, model)` cursor valid for the lifetime of `txn`.
    ///
    /// Consume the cursor inside the block that owns the transaction:
    ///
    /// ```
    /// use dbkit_store::{Collection, MemoryBackend, Store, StoreResult};
    ///
    /// let store = Store::new(MemoryBackend::new());
    /// let names: Collection<MemoryBackend, String> =
    ///     Collection::open(&store, "names", |n: &String| n.clone()).unwrap();
    /// names.create(&"ada".to_string(), None).unwrap();
    ///
    /// let keys = store
    ///     .read(|txn| -> StoreResult<Vec<String>> {
    ///         Ok(names.each(txn)?.map(|(key, _)| key).collect())
    ///     })
    ///     .unwrap();
    /// assert_eq!(keys, vec!["ada"]);
    /// ```
    ///
    /// A cursor cannot escape its transaction:
    ///
    /// ```compile_fail
    /// use dbkit_store::{Collection, MemoryBackend, Store, StoreResult};
    ///
    /// let store = Store::new(MemoryBackend::new());
    /// let names: Collection<MemoryBackend, String> =
    ///     Collection::open(&store, "names", |n: &String| n.clone()).unwrap();
    ///
    /// let records = store.read(|txn| -> StoreResult<_> { names.each(txn) }).unwrap();
    /// let _ = records.count();
    /// ```
    ///
    /// Nor can the transaction end while a cursor is alive:
    ///
    /// ```compile_fail
    /// use dbkit_store::{Collection, KvBackend, KvTxn, MemoryBackend, Store};
    ///
    /// let store = Store::new(MemoryBackend::new());
    /// let names: Collection<MemoryBackend, String> =
    ///     Collection::open(&store, "names", |n: &String| n.clone()).unwrap();
    ///
    /// let txn = store.backend().begin_read().unwrap();
    /// let records = names.each(&txn).unwrap();
    /// txn.abort();
    /// let _ = records.count();
    /// ```
    pub fn each<'t>(&'t self, txn: &'t B::Txn<'_>) -> StoreResult<Records<'t, M>> {
        let cursor = self.raw.cursor(txn)?;
        Ok(Records::new(&self.name, cursor, &*self.codec))
    }

    /// Lazy model cursor valid for the lifetime of `txn`.
    pub fn each_document<'t>(&'t self, txn: &'t B::Txn<'_>) -> StoreResult<Documents<'t, M>> {
        Ok(self.each(txn)?.documents())
    }

    /// Remove every record. Triggers are not fired.
    pub fn empty(&self) -> StoreResult<()> {
        self.raw.clear()
    }
}

impl<B: KvBackend, M> std::fmt::Debug for Collection<B, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("triggers", &self.triggers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SerdeCodec;
    use crate::index::Index;
    use crate::memory::MemoryBackend;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Card {
        word: String,
        priority: i64,
    }

    fn card(word: &str, priority: i64) -> Card {
        Card {
            word: word.into(),
            priority,
        }
    }

    fn cards(store: &Store<MemoryBackend>) -> Collection<MemoryBackend, Card> {
        Collection::open(store, "cards", |c: &Card| c.word.clone()).unwrap()
    }

    fn store() -> Store<MemoryBackend> {
        Store::new(MemoryBackend::new())
    }

    // -----------------------------------------------------------------------
    // Cards walkthrough
    // -----------------------------------------------------------------------

    #[test]
    fn cards_walkthrough() {
        let store = store();
        let cards = cards(&store);

        cards.create(&card("world", 1), None).unwrap();
        assert_eq!(cards.get("world", None).unwrap().unwrap().priority, 1);

        let err = cards.create(&card("world", 1), None).unwrap_err();
        assert!(err.is_already_exists());

        cards.update_one(&card("world", 2), None).unwrap();
        assert_eq!(cards.get("world", None).unwrap().unwrap().priority, 2);

        let twos = cards.find(|_, c| c.priority == 2, None).unwrap();
        assert_eq!(twos, vec![card("world", 2)]);
        let ones = cards.find(|_, c| c.priority == 1, None).unwrap();
        assert!(ones.is_empty());
    }

    // -----------------------------------------------------------------------
    // Guarded writes
    // -----------------------------------------------------------------------

    #[test]
    fn create_twice_keeps_first_value() {
        let store = store();
        let cards = cards(&store);
        cards.create(&card("dup", 1), None).unwrap();
        let err = cards.create(&card("dup", 9), None).unwrap_err();
        match err {
            StoreError::KeyAlreadyExists { collection, key } => {
                assert_eq!(collection, "cards");
                assert_eq!(key, "dup");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cards.find_by_key("dup", None).unwrap(), card("dup", 1));
    }

    #[test]
    fn update_missing_fails_and_leaves_collection_unchanged() {
        let store = store();
        let cards = cards(&store);
        cards.create(&card("present", 1), None).unwrap();

        let err = cards.update_one(&card("absent", 5), None).unwrap_err();
        match err {
            StoreError::KeyNotFound { collection, key } => {
                assert_eq!(collection, "cards");
                assert_eq!(key, "absent");
            }
            other => panic!("unexpected error: {other}"),
        }
        let all = cards.find(|_, _| true, None).unwrap();
        assert_eq!(all, vec![card("present", 1)]);
    }

    #[test]
    fn find_by_key_missing_is_not_found() {
        let store = store();
        let cards = cards(&store);
        let err = cards.find_by_key("nothing", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn words_and_cards_are_separate_partitions() {
        let store = store();
        let cards = cards(&store);
        let words: Collection<MemoryBackend, Card> =
            Collection::open(&store, "words", |c: &Card| c.word.clone()).unwrap();
        cards.create(&card("findById", 1), None).unwrap();
        let err = words.find_by_key("findById", None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::KeyNotFound { ref collection, .. } if collection == "words"
        ));
    }

    #[test]
    fn set_bypasses_triggers() {
        let store = store();
        let mut cards = cards(&store);
        let fired = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&fired);
        cards.add_after_set_trigger(move |_, _, _, _| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });
        cards.set("raw", &card("raw", 1), None).unwrap();
        assert_eq!(*fired.lock().unwrap(), 0);
        cards.create(&card("guarded", 1), None).unwrap();
        assert_eq!(*fired.lock().unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Triggers
    // -----------------------------------------------------------------------

    type Seen = Arc<Mutex<Vec<(String, i64, Option<i64>)>>>;

    fn recording(cards: &mut Collection<MemoryBackend, Card>) -> Seen {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cards.add_after_set_trigger(move |key, new, old, _txn| {
            sink.lock()
                .unwrap()
                .push((key.to_string(), new.priority, old.map(|c| c.priority)));
            Ok(())
        });
        seen
    }

    #[test]
    fn triggers_receive_old_values() {
        let store = store();
        let mut cards = cards(&store);
        let seen = recording(&mut cards);

        cards.create(&card("w", 1), None).unwrap();
        cards.update_one(&card("w", 2), None).unwrap();
        cards.create_or_update_one(&card("x", 3), None).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("w".to_string(), 1, None),
                ("w".to_string(), 2, Some(1)),
                ("x".to_string(), 3, None),
            ]
        );
    }

    #[test]
    fn create_or_update_is_idempotent() {
        let store = store();
        let mut cards = cards(&store);
        let seen = recording(&mut cards);

        cards.create_or_update_one(&card("same", 4), None).unwrap();
        cards.create_or_update_one(&card("same", 4), None).unwrap();

        assert_eq!(cards.find_by_key("same", None).unwrap(), card("same", 4));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].2, None);
        assert_eq!(seen[1].2, Some(4));
    }

    #[test]
    fn triggers_fire_in_registration_order() {
        let store = store();
        let mut cards = cards(&store);
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            cards.add_after_set_trigger(move |_, _, _, _| {
                order.lock().unwrap().push(label);
                Ok(())
            });
        }
        assert_eq!(cards.trigger_count(), 3);
        cards.create(&card("a", 1), None).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    fn indexed_cards(
        store: &Store<MemoryBackend>,
    ) -> (Collection<MemoryBackend, Card>, Index<MemoryBackend>) {
        let mut cards = cards(store);
        let index = Index::open(store, "cards-by-priority").unwrap();
        let writer = index.clone();
        cards.add_after_set_trigger(move |key, new, old, mut txn| {
            if let Some(old) = old {
                writer.delete(&old.priority.to_string(), txn.as_deref_mut())?;
            }
            writer.set(&new.priority.to_string(), key, txn)
        });
        (cards, index)
    }

    #[test]
    fn trigger_writes_share_the_transaction() {
        let store = store();
        let (cards, index) = indexed_cards(&store);

        store
            .write(|txn| -> StoreResult<()> {
                cards.create(&card("world", 1), Some(&mut *txn))?;
                // Visible inside the transaction that wrote it.
                assert_eq!(index.get("1", Some(&*txn))?.as_deref(), Some("world"));
                cards.update_one(&card("world", 2), Some(txn))
            })
            .unwrap();

        assert!(index.get("1", None).unwrap().is_none());
        assert_eq!(index.get("2", None).unwrap().as_deref(), Some("world"));
    }

    #[test]
    fn aborted_transaction_rolls_back_trigger_writes() {
        let store = store();
        let (cards, index) = indexed_cards(&store);

        let result = store.write(|txn| -> StoreResult<()> {
            cards.create(&card("world", 1), Some(&mut *txn))?;
            assert_eq!(index.get("1", Some(&*txn))?.as_deref(), Some("world"));
            Err(StoreError::InvariantViolation("caller gave up".into()))
        });

        assert!(result.is_err());
        assert!(cards.get("world", None).unwrap().is_none());
        assert!(index.get("1", None).unwrap().is_none());
    }

    #[test]
    fn failing_trigger_aborts_enclosing_transaction() {
        let store = store();
        let mut cards = cards(&store);
        cards.add_after_set_trigger(|key, _, _, _| {
            Err(StoreError::InvariantViolation(format!("rejected {key}")))
        });

        let result = store.write(|txn| cards.create(&card("w", 1), Some(txn)));
        assert!(matches!(result, Err(StoreError::InvariantViolation(_))));
        assert!(cards.get("w", None).unwrap().is_none());
    }

    #[test]
    fn failing_trigger_under_auto_commit_keeps_primary_write() {
        let store = store();
        let mut cards = cards(&store);
        cards.add_after_set_trigger(|_, _, _, _| {
            Err(StoreError::InvariantViolation("index unavailable".into()))
        });

        let err = cards.create(&card("w", 1), None).unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
        // The primary write already committed on its own.
        assert_eq!(cards.get("w", None).unwrap(), Some(card("w", 1)));
    }

    // -----------------------------------------------------------------------
    // Decode failures
    // -----------------------------------------------------------------------

    #[test]
    fn get_surfaces_decode_failure() {
        let store = store();
        let cards = cards(&store);
        cards.raw().set("broken", b"not json", None).unwrap();
        let err = cards.get("broken", None).unwrap_err();
        match &err {
            StoreError::Decode { collection, key, .. } => {
                assert_eq!(collection, "cards");
                assert_eq!(key.as_deref(), Some("broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("broken"));
        assert!(matches!(
            cards.find_by_key("broken", None),
            Err(StoreError::Decode { key: Some(_), .. })
        ));
    }

    #[test]
    fn find_skips_undecodable_records() {
        let store = store();
        let cards = cards(&store);
        cards.create(&card("good", 1), None).unwrap();
        cards.raw().set("broken", b"{\"word\":", None).unwrap();
        cards.create(&card("fine", 1), None).unwrap();

        let found = cards.find(|_, _| true, None).unwrap();
        assert_eq!(found, vec![card("good", 1), card("fine", 1)]);

        let report = cards.find_with_report(|_, _| true, None).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, "broken");
    }

    #[test]
    fn find_result_independent_of_order() {
        let store = store();
        let cards = cards(&store);
        for i in 0..100 {
            cards.create(&card(&i.to_string(), i / 10), None).unwrap();
        }
        let mut found = cards.find(|_, c| c.priority == 3, None).unwrap();
        found.sort_by(|a, b| a.word.cmp(&b.word));
        let words: Vec<_> = found.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(
            words,
            vec!["30", "31", "32", "33", "34", "35", "36", "37", "38", "39"]
        );
    }

    #[test]
    fn find_predicate_sees_keys() {
        let store = store();
        let cards = cards(&store);
        cards.create(&card("alpha", 1), None).unwrap();
        cards.create(&card("beta", 1), None).unwrap();
        let found = cards.find(|key, _| key.starts_with('a'), None).unwrap();
        assert_eq!(found, vec![card("alpha", 1)]);
    }

    // -----------------------------------------------------------------------
    // Lazy cursors
    // -----------------------------------------------------------------------

    #[test]
    fn each_yields_keys_and_models() {
        let store = store();
        let cards = cards(&store);
        cards.create(&card("a", 1), None).unwrap();
        cards.raw().set("bad", b"???", None).unwrap();
        cards.create(&card("b", 2), None).unwrap();

        store
            .read(|txn| -> StoreResult<()> {
                let mut records = cards.each(txn)?;
                let pairs: Vec<_> = records.by_ref().collect();
                assert_eq!(
                    pairs,
                    vec![("a".to_string(), card("a", 1)), ("b".to_string(), card("b", 2))]
                );
                assert_eq!(records.skipped(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn each_document_stops_early() {
        let store = store();
        let cards = cards(&store);
        for i in 0..5 {
            cards.create(&card(&format!("w{i}"), i), None).unwrap();
        }
        let first_two = store
            .read(|txn| -> StoreResult<Vec<Card>> {
                Ok(cards.each_document(txn)?.take(2).collect())
            })
            .unwrap();
        assert_eq!(first_two, vec![card("w0", 0), card("w1", 1)]);
    }

    // -----------------------------------------------------------------------
    // Codecs and emptying
    // -----------------------------------------------------------------------

    #[test]
    fn custom_codec_is_used() {
        let store = store();
        let codec: Arc<dyn ModelCodec<Card>> = Arc::new(SerdeCodec::bincode());
        let cards: Collection<MemoryBackend, Card> =
            Collection::with_codec(&store, "binary-cards", |c: &Card| c.word.clone(), codec)
                .unwrap();
        cards.create(&card("w", 1), None).unwrap();
        let raw = cards.raw().get("w", None).unwrap().unwrap();
        assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_err());
        assert_eq!(cards.find_by_key("w", None).unwrap(), card("w", 1));
    }

    #[test]
    fn empty_clears_collection() {
        let store = store();
        let cards = cards(&store);
        cards.create(&card("a", 1), None).unwrap();
        cards.empty().unwrap();
        assert!(cards.find(|_, _| true, None).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_record() {
        let store = store();
        let cards = cards(&store);
        cards.create(&card("a", 1), None).unwrap();
        cards.delete("a", None).unwrap();
        assert!(cards.get("a", None).unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest::proptest! {
        #[test]
        fn create_then_find_by_key_roundtrips(word in "[a-z0-9]{1,16}", priority in proptest::num::i64::ANY) {
            let store = store();
            let cards = cards(&store);
            let model = card(&word, priority);
            cards.create(&model, None).unwrap();
            let key = cards.key_of(&model);
            proptest::prop_assert_eq!(cards.find_by_key(&key, None).unwrap(), model);
        }
    }
}
