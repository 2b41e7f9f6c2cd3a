//! Per-thread transaction bookkeeping.
//!
//! A thread holds at most one transaction per backend. Every transaction,
//! explicit or auto-committed, first claims the thread's slot here; a second
//! claim while the first is live fails with
//! [`StoreError::InvariantViolation`]. Disk engines would otherwise deadlock
//! on their writer lock, and the memory backend would open an independent
//! transaction that outlives an outer abort.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use crate::error::{StoreError, StoreResult};

/// Threads currently holding a transaction on one backend.
#[derive(Debug, Default)]
pub struct ActiveTxns {
    threads: Mutex<HashSet<ThreadId>>,
}

impl ActiveTxns {
    /// Claim the calling thread's slot, failing if it is already taken.
    pub fn enter(self: &Arc<Self>) -> StoreResult<ThreadSlot> {
        let thread = thread::current().id();
        let mut threads = self.threads.lock().expect("lock poisoned");
        if !threads.insert(thread) {
            return Err(StoreError::InvariantViolation(
                "thread already holds an open transaction; pass it to the operation instead of opening another"
                    .into(),
            ));
        }
        Ok(ThreadSlot {
            owner: Arc::clone(self),
            thread,
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.threads.lock().expect("lock poisoned").len()
    }
}

/// Releases the thread's slot on drop.
#[derive(Debug)]
pub struct ThreadSlot {
    owner: Arc<ActiveTxns>,
    thread: ThreadId,
}

impl Drop for ThreadSlot {
    fn drop(&mut self) {
        self.owner
            .threads
            .lock()
            .expect("lock poisoned")
            .remove(&self.thread);
    }
}
