//! Lock-free read side, single-writer copy-update, grace-period reclamation.
//!
//! Readers pay two atomic loads and a pair of acquire/release fences per
//! critical section and never block. Writers are serialized behind a single
//! mutex and stage their changes on a standby copy before publishing it with
//! [`Rcu::begin_update`] / [`UpdateGuard::commit`]. A writer that never calls
//! `commit` leaves the active buffer untouched — this is how a malformed or
//! unverified update is discarded without ever becoming visible to readers.

use std::cell::{Cell, UnsafeCell};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Upper bound on concurrently active readers. A reader beyond this count
/// reuses slot zero, which only degrades the grace-period wait, never
/// correctness.
pub const RCU_MAX_READERS: usize = 256;

const SYNCHRONIZE_BUDGET: Duration = Duration::from_millis(1000);

thread_local! {
    static READER_SLOT: Cell<Option<usize>> = Cell::new(None);
}

/// A double-buffered container publishing immutable snapshots of `T`.
pub struct Rcu<T> {
    buffers: [UnsafeCell<T>; 2],
    active: AtomicUsize,
    epoch: AtomicU64,
    writer: Mutex<()>,
    reader_epochs: Box<[AtomicU64]>,
    slot_alloc: AtomicUsize,
}

// SAFETY: access to `buffers` is mediated entirely by `active`, `epoch`, and
// `reader_epochs`: the active slot is never mutated, and the standby slot is
// only ever touched while `writer` is held.
unsafe impl<T: Send> Send for Rcu<T> {}
unsafe impl<T: Send> Sync for Rcu<T> {}

impl<T: Clone> Rcu<T> {
    pub fn new(initial: T) -> Self {
        let standby = initial.clone();
        let mut reader_epochs = Vec::with_capacity(RCU_MAX_READERS);
        reader_epochs.resize_with(RCU_MAX_READERS, || AtomicU64::new(0));
        Self {
            buffers: [UnsafeCell::new(initial), UnsafeCell::new(standby)],
            active: AtomicUsize::new(0),
            epoch: AtomicU64::new(0),
            writer: Mutex::new(()),
            reader_epochs: reader_epochs.into_boxed_slice(),
            slot_alloc: AtomicUsize::new(0),
        }
    }

    /// Enters a read critical section and returns a guard dereferencing to
    /// the currently active snapshot. The guard must be dropped before any
    /// writer's `synchronize` can complete, so callers should not hold it
    /// across blocking operations.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let slot = self.reader_slot();
        loop {
            let epoch = self.epoch.load(Ordering::Acquire);
            self.reader_epochs[slot].store(epoch + 1, Ordering::Release);
            let active = self.active.load(Ordering::Acquire);
            // `commit` bumps `epoch` strictly before it flips `active`. If
            // `epoch` moved between our two loads, a commit raced us in
            // that window and `active` may already be the post-swap index
            // even though the epoch we just recorded doesn't reflect it;
            // retry so the published epoch and the buffer we dereference
            // always come from the same commit.
            if self.epoch.load(Ordering::Acquire) == epoch {
                return ReadGuard {
                    rcu: self,
                    slot,
                    value: unsafe { &*self.buffers[active].get() },
                };
            }
        }
    }

    /// Begins a staged update: the standby buffer is seeded with a clone of
    /// the active buffer and handed to the caller as `&mut T`. Nothing is
    /// visible to readers until [`UpdateGuard::commit`] is called.
    pub fn begin_update(&self) -> UpdateGuard<'_, T> {
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let pre_epoch = self.epoch.load(Ordering::Acquire);
        let active = self.active.load(Ordering::Acquire);
        let standby_slot = 1 - active;
        // SAFETY: `writer` is held, so no other writer can reach `standby_slot`;
        // `standby_slot` is never the active slot, so readers cannot reach it.
        let standby: &mut T = unsafe { &mut *self.buffers[standby_slot].get() };
        let current: &T = unsafe { &*self.buffers[active].get() };
        standby.clone_from(current);
        UpdateGuard {
            rcu: self,
            _writer,
            standby_slot,
            pre_epoch,
        }
    }

    fn reader_slot(&self) -> usize {
        READER_SLOT.with(|cell| {
            if let Some(slot) = cell.get() {
                return slot;
            }
            let slot = self.slot_alloc.fetch_add(1, Ordering::Relaxed) % RCU_MAX_READERS;
            cell.set(Some(slot));
            slot
        })
    }

    fn synchronize(&self, pre_epoch: u64) {
        let deadline = Instant::now() + SYNCHRONIZE_BUDGET;
        loop {
            let stuck = self
                .reader_epochs
                .iter()
                .any(|slot| {
                    let v = slot.load(Ordering::Acquire);
                    v != 0 && v <= pre_epoch + 1
                });
            if !stuck {
                return;
            }
            if Instant::now() >= deadline {
                tracing::warn!("rcu synchronize timed out waiting for readers");
                return;
            }
            std::thread::yield_now();
        }
    }
}

/// Borrowed view of the active snapshot, valid until dropped.
pub struct ReadGuard<'a, T> {
    rcu: &'a Rcu<T>,
    slot: usize,
    value: &'a T,
}

impl<T> std::ops::Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.value
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.rcu.reader_epochs[self.slot].store(0, Ordering::Release);
    }
}

/// A staged, not-yet-published update. Mutate via `DerefMut`, then either
/// call [`commit`](UpdateGuard::commit) to publish or drop to discard.
pub struct UpdateGuard<'a, T: Clone> {
    rcu: &'a Rcu<T>,
    _writer: std::sync::MutexGuard<'a, ()>,
    standby_slot: usize,
    pre_epoch: u64,
}

impl<T: Clone> std::ops::Deref for UpdateGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.rcu.buffers[self.standby_slot].get() }
    }
}

impl<T: Clone> std::ops::DerefMut for UpdateGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.rcu.buffers[self.standby_slot].get() }
    }
}

impl<T: Clone> UpdateGuard<'_, T> {
    /// Publishes the staged buffer: flips the active index, bumps the
    /// epoch, and waits out the grace period for pre-swap readers.
    pub fn commit(self) {
        self.rcu.epoch.fetch_add(1, Ordering::SeqCst);
        self.rcu.active.store(self.standby_slot, Ordering::SeqCst);
        self.rcu.synchronize(self.pre_epoch);
    }
}
