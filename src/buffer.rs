//! Thread-safe buffering of snapshot batches between collection ticks.
//!
//! The collection job appends one batch per tick; the aggregation job
//! drains everything accumulated since the previous cycle in a single
//! container swap. The lock is held only for the push or the swap, never
//! across I/O or merge work, so producers are never blocked behind a
//! slow aggregation pass.

use crate::sampler::WindowSnapshot;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only buffer of snapshot batches with atomic drain-and-reset.
///
/// One batch is the set of windows captured together on a single tick.
/// An `append` racing a drain is strictly ordered before or after it;
/// every batch is observed by exactly one drain.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    batches: Mutex<Vec<Vec<WindowSnapshot>>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one capture tick's snapshots.
    pub fn append(&self, batch: Vec<WindowSnapshot>) {
        self.lock().push(batch);
    }

    /// Atomically take every buffered batch, leaving the buffer empty.
    ///
    /// Batches come back in append order. Ownership of the drained
    /// generation moves to the caller; no copies are made.
    pub fn drain_and_reset(&self) -> Vec<Vec<WindowSnapshot>> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of batches currently buffered.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock still holds structurally valid batches.
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<WindowSnapshot>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
