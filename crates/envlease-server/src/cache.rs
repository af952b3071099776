//! Approximate "does this resource exist" index.
//!
//! [`ExistenceCache`] answers membership from an in-memory set so most
//! commands skip a store round trip. It is populated at construction,
//! patched write-through by create/delete, and rebuilt from the store every
//! `threshold` lookups. The rebuild bounds how long an out-of-band store
//! mutation can go unseen.
//!
//! Refreshes are serialized by their own mutex. `add`/`remove` never wait on
//! a refresh: while one is loading, patches are applied to the live set and
//! queued for replay onto the freshly loaded set before it is swapped in.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use envlease_core::ResourceId;
use envlease_storage::{LeaseStore, StorageError};

#[derive(Debug, Clone)]
enum Patch {
    Add(ResourceId),
    Remove(ResourceId),
}

#[derive(Debug, Default)]
struct CacheState {
    ids: HashSet<ResourceId>,
    refreshing: bool,
    pending: Vec<Patch>,
}

impl CacheState {
    fn apply(ids: &mut HashSet<ResourceId>, patch: Patch) {
        match patch {
            Patch::Add(id) => {
                ids.insert(id);
            }
            Patch::Remove(id) => {
                ids.remove(&id);
            }
        }
    }

    fn patch(&mut self, patch: Patch) {
        if self.refreshing {
            self.pending.push(patch.clone());
        }
        Self::apply(&mut self.ids, patch);
    }
}

/// Derived set of known resource identifiers with threshold-driven rebuilds.
pub struct ExistenceCache {
    store: Arc<dyn LeaseStore>,
    state: RwLock<CacheState>,
    lookups: AtomicUsize,
    threshold: usize,
    refresh_lock: Mutex<()>,
}

impl ExistenceCache {
    /// Builds the cache and loads it from `store`.
    ///
    /// A `threshold` of zero is treated as one (refresh on every lookup).
    pub fn new(store: Arc<dyn LeaseStore>, threshold: usize) -> Result<Self, StorageError> {
        let cache = ExistenceCache {
            store,
            state: RwLock::new(CacheState::default()),
            lookups: AtomicUsize::new(0),
            threshold: threshold.max(1),
            refresh_lock: Mutex::new(()),
        };
        cache.refresh()?;
        Ok(cache)
    }

    /// Membership check. Counts as one lookup; the lookup that reaches the
    /// threshold rebuilds the set before answering.
    ///
    /// A failed rebuild is logged and the current set answers instead.
    pub fn contains(&self, id: &ResourceId) -> bool {
        let seen = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        if seen >= self.threshold {
            if let Err(err) = self.refresh_if_due() {
                tracing::warn!("existence cache refresh failed, serving stale set: {}", err);
            }
        }
        let hit = self.read_state().ids.contains(id);
        tracing::debug!(resource = %id, hit, "existence cache lookup");
        hit
    }

    /// Rebuilds the set from the store and resets the lookup counter.
    pub fn refresh(&self) -> Result<usize, StorageError> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.reload()
    }

    /// Write-through patch after a create.
    pub fn add(&self, id: &ResourceId) {
        self.write_state().patch(Patch::Add(id.clone()));
    }

    /// Write-through patch after a delete.
    pub fn remove(&self, id: &ResourceId) {
        self.write_state().patch(Patch::Remove(id.clone()));
    }

    /// Number of identifiers currently cached.
    pub fn len(&self) -> usize {
        self.read_state().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups counted since the last rebuild.
    pub fn lookups_since_refresh(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Refreshes unless another caller already did while this one waited.
    fn refresh_if_due(&self) -> Result<(), StorageError> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.lookups.load(Ordering::SeqCst) >= self.threshold {
            self.reload()?;
        }
        Ok(())
    }

    /// Caller must hold `refresh_lock`.
    fn reload(&self) -> Result<usize, StorageError> {
        {
            let mut state = self.write_state();
            state.refreshing = true;
            state.pending.clear();
        }

        // The store read happens without the set lock so lookups and patches
        // proceed against the old set meanwhile.
        let loaded = match self.store.list_all_ids() {
            Ok(ids) => ids,
            Err(err) => {
                let mut state = self.write_state();
                state.refreshing = false;
                state.pending.clear();
                return Err(err);
            }
        };

        let mut ids: HashSet<ResourceId> = loaded.into_iter().collect();
        let count = {
            let mut state = self.write_state();
            for patch in state.pending.drain(..) {
                CacheState::apply(&mut ids, patch);
            }
            state.ids = ids;
            state.refreshing = false;
            state.ids.len()
        };
        self.lookups.store(0, Ordering::SeqCst);

        tracing::info!(resources = count, "existence cache refreshed");
        Ok(count)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
