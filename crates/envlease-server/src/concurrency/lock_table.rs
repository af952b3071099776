//! Per-resource mutual exclusion.
//!
//! [`LockTable`] hands out one mutex per [`ResourceId`]. Operations on the
//! same resource are totally ordered by lock acquisition; operations on
//! different resources never contend. Entries are created on first use and
//! never removed, so a guard taken for a name always refers to the same
//! mutex as every other guard for that name.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use envlease_core::ResourceId;

/// Map of resource identifier to its mutex.
#[derive(Default)]
pub struct LockTable {
    locks: DashMap<ResourceId, Arc<Mutex<()>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex for `id`, creating it if needed.
    pub fn lock_for(&self, id: &ResourceId) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(id) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Number of resources that have ever been locked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Runs `f` while holding the lock for `id`.
///
/// A poisoned mutex is recovered: every critical section leaves the record
/// either unchanged or fully persisted before it can panic.
pub fn with_resource_lock<T>(table: &LockTable, id: &ResourceId, f: impl FnOnce() -> T) -> T {
    let lock = table.lock_for(id);
    let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
    f()
}
