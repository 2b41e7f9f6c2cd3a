//! Transaction-scoped lazy cursors.
//!
//! Every cursor here borrows the transaction that produced it, so the borrow
//! checker rejects any use after that transaction commits or aborts.

use std::fmt;

use tracing::warn;

use crate::codec::ModelCodec;

/// A raw `(key, payload)` pair yielded by a backend cursor.
pub type RawEntry = (String, Vec<u8>);

/// Forward-only, single-pass cursor over a backend collection.
pub struct RawCursor<'t> {
    inner: Box<dyn Iterator<Item = RawEntry> + 't>,
}

impl<'t> RawCursor<'t> {
    /// Wrap a backend iterator.
    pub fn new(inner: impl Iterator<Item = RawEntry> + 't) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl Iterator for RawCursor<'_> {
    type Item = RawEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for RawCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCursor").finish_non_exhaustive()
    }
}

/// Lazy `(key, model)` sequence decoded from a [`RawCursor`].
///
/// Records whose payload fails to decode are logged and skipped; the count of
/// skipped records is available from [`Records::skipped`].
pub struct Records<'t, M> {
    collection: &'t str,
    cursor: RawCursor<'t>,
    codec: &'t dyn ModelCodec<M>,
    skipped: usize,
}

impl<'t, M> Records<'t, M> {
    pub(crate) fn new(
        collection: &'t str,
        cursor: RawCursor<'t>,
        codec: &'t dyn ModelCodec<M>,
    ) -> Self {
        Self {
            collection,
            cursor,
            codec,
            skipped: 0,
        }
    }

    /// Number of undecodable records passed over so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Drop the keys and yield only models.
    pub fn documents(self) -> Documents<'t, M> {
        Documents { records: self }
    }
}

impl<M> Iterator for Records<'_, M> {
    type Item = (String, M);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, data) in self.cursor.by_ref() {
            match self.codec.decode(&data) {
                Ok(model) => return Some((key, model)),
                Err(err) => {
                    self.skipped += 1;
                    warn!(
                        collection = self.collection,
                        key = %key,
                        error = %err,
                        "skipping undecodable record"
                    );
                }
            }
        }
        None
    }
}

/// Lazy model-only sequence. See [`Records`].
pub struct Documents<'t, M> {
    records: Records<'t, M>,
}

impl<M> Documents<'_, M> {
    /// Number of undecodable records passed over so far.
    pub fn skipped(&self) -> usize {
        self.records.skipped()
    }
}

impl<M> Iterator for Documents<'_, M> {
    type Item = M;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|(_, model)| model)
    }
}
