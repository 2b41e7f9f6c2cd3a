//! String-to-string secondary index.

use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use crate::traits::{KvBackend, KvCollection};

/// A derived collection mapping an index key to a primary key.
///
/// Populate it only from the triggers of the collection it indexes. Writing
/// to it from anywhere else lets it drift out of sync; that is not detected.
pub struct Index<B: KvBackend> {
    name: String,
    raw: Arc<B::Collection>,
}

impl<B: KvBackend> Index<B> {
    /// Open (creating if needed) the named index collection.
    pub fn open(store: &Store<B>, name: &str) -> StoreResult<Self> {
        Ok(Self {
            name: name.to_string(),
            raw: store.open_collection(name)?,
        })
    }

    /// Name of the backing collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key recorded under `key`, if any.
    pub fn get(&self, key: &str, txn: Option<&B::Txn<'_>>) -> StoreResult<Option<String>> {
        let Some(data) = self.raw.get(key, txn)? else {
            return Ok(None);
        };
        String::from_utf8(data)
            .map(Some)
            .map_err(|e| StoreError::Decode {
                collection: self.name.clone(),
                key: Some(key.to_string()),
                reason: e.to_string(),
            })
    }

    /// Point `key` at the primary key `value`.
    pub fn set(&self, key: &str, value: &str, txn: Option<&mut B::Txn<'_>>) -> StoreResult<()> {
        self.raw.set(key, value.as_bytes(), txn)
    }

    /// Remove the entry for `key`. Absent keys are a no-op.
    pub fn delete(&self, key: &str, txn: Option<&mut B::Txn<'_>>) -> StoreResult<()> {
        self.raw.delete(key, txn)
    }
}

impl<B: KvBackend> Clone for Index<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            raw: Arc::clone(&self.raw),
        }
    }
}

impl<B: KvBackend> std::fmt::Debug for Index<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    #[test]
    fn set_get_delete() {
        let store = Store::new(MemoryBackend::new());
        let index = Index::open(&store, "by-email").unwrap();
        index.set("a@example.com", "user-1", None).unwrap();
        assert_eq!(
            index.get("a@example.com", None).unwrap().as_deref(),
            Some("user-1")
        );
        index.delete("a@example.com", None).unwrap();
        assert!(index.get("a@example.com", None).unwrap().is_none());
    }

    #[test]
    fn non_utf8_payload_is_decode_error() {
        let store = Store::new(MemoryBackend::new());
        let index = Index::open(&store, "by-email").unwrap();
        index.raw.set("bad", &[0xff, 0xfe], None).unwrap();
        let err = index.get("bad", None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Decode { key: Some(ref k), .. } if k == "bad"
        ));
    }

    #[test]
    fn clones_share_storage() {
        let store = Store::new(MemoryBackend::new());
        let index = Index::open(&store, "idx").unwrap();
        let other = index.clone();
        other.set("k", "v", None).unwrap();
        assert_eq!(index.get("k", None).unwrap().as_deref(), Some("v"));
    }
}
