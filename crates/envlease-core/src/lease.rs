//! The per-resource lease state machine.
//!
//! [`LeaseRecord`] holds a resource's exclusive lease (if any) and the set of
//! identities watching it. Every method is a pure in-memory transition;
//! callers are responsible for serializing access and persisting the result.
//!
//! Expiry is lazy: a lease whose `until` has passed is simply not held. No
//! timer ever rewrites a record. [`LeaseRecord::clear_if_expired`] exists for
//! callers that want to drop the stale lease explicitly, but no held-check
//! depends on it having run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ResourceId, UserId};

/// Policy ceiling on a single reservation, in minutes (24 hours).
pub const DEFAULT_MAX_LEASE_MINUTES: i64 = 24 * 60;

/// An exclusive hold on a resource by one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub holder: UserId,
    pub until: DateTime<Utc>,
}

impl Lease {
    /// A lease is active strictly before its expiry instant.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.until > now
    }
}

/// One watcher registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub watcher: UserId,
    pub until: DateTime<Utc>,
}

impl WatchEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.until < now
    }
}

/// Read-only view of whether a resource is currently held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LeaseStatus {
    Free,
    Held {
        holder: UserId,
        until: DateTime<Utc>,
    },
}

impl LeaseStatus {
    pub fn is_held(&self) -> bool {
        matches!(self, LeaseStatus::Held { .. })
    }
}

/// Exclusivity state plus active watchers for one resource.
///
/// `lease` is `Some` only while a reservation has been made and not yet
/// released; it may still be `Some` after expiry, which reads as free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    name: ResourceId,
    lease: Option<Lease>,
    watchers: Vec<WatchEntry>,
    max_lease_minutes: i64,
}

impl LeaseRecord {
    /// Creates a free, unwatched record with the default lease ceiling.
    pub fn new(name: ResourceId) -> Self {
        Self::with_max_lease(name, DEFAULT_MAX_LEASE_MINUTES)
    }

    pub fn with_max_lease(name: ResourceId, max_lease_minutes: i64) -> Self {
        LeaseRecord {
            name,
            lease: None,
            watchers: Vec::new(),
            max_lease_minutes,
        }
    }

    /// Rebuilds a record from persisted parts.
    ///
    /// Duplicate watcher identities are collapsed with the later-of rule so a
    /// hand-edited row cannot break the one-entry-per-identity invariant.
    pub fn from_parts(
        name: ResourceId,
        lease: Option<Lease>,
        watchers: Vec<WatchEntry>,
        max_lease_minutes: i64,
    ) -> Self {
        let mut record = LeaseRecord {
            name,
            lease,
            watchers: Vec::with_capacity(watchers.len()),
            max_lease_minutes,
        };
        for entry in watchers {
            record.merge_watch(entry.watcher, entry.until);
        }
        record
    }

    pub fn name(&self) -> &ResourceId {
        &self.name
    }

    /// The stored lease, whether or not it has expired.
    pub fn lease(&self) -> Option<&Lease> {
        self.lease.as_ref()
    }

    /// All stored watch entries, including any not yet pruned.
    pub fn watchers(&self) -> &[WatchEntry] {
        &self.watchers
    }

    pub fn max_lease_minutes(&self) -> i64 {
        self.max_lease_minutes
    }

    /// True iff a lease exists and its expiry is strictly after `now`.
    pub fn is_held(&self, now: DateTime<Utc>) -> bool {
        self.active_lease(now).is_some()
    }

    /// The lease, if it is still active at `now`.
    pub fn active_lease(&self, now: DateTime<Utc>) -> Option<&Lease> {
        self.lease.as_ref().filter(|lease| lease.is_active(now))
    }

    pub fn status(&self, now: DateTime<Utc>) -> LeaseStatus {
        match self.active_lease(now) {
            Some(lease) => LeaseStatus::Held {
                holder: lease.holder.clone(),
                until: lease.until,
            },
            None => LeaseStatus::Free,
        }
    }

    /// Watch entries still in force at `now`, without mutating the record.
    pub fn active_watchers(&self, now: DateTime<Utc>) -> impl Iterator<Item = &WatchEntry> {
        self.watchers.iter().filter(move |entry| !entry.is_expired(now))
    }

    /// Grants the lease to `holder` until `until`.
    ///
    /// The caller must have checked `!is_held(now)`. Acquiring clears the
    /// watcher set; the surviving (unexpired) watchers are returned so the
    /// caller can tell each of them the resource has been taken.
    pub fn acquire(
        &mut self,
        holder: UserId,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<WatchEntry> {
        debug_assert!(!self.is_held(now), "acquire on a held lease");
        self.lease = Some(Lease { holder, until });
        self.take_watchers(now)
    }

    /// Drops the lease. Both holder and expiry are cleared.
    pub fn release(&mut self) -> Option<Lease> {
        self.lease.take()
    }

    /// Drops a lease that has expired at `now`. Idempotent; returns whether a
    /// stale lease was removed.
    pub fn clear_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        match &self.lease {
            Some(lease) if !lease.is_active(now) => {
                self.lease = None;
                true
            }
            _ => false,
        }
    }

    /// Registers or extends a watch and returns the effective expiry.
    ///
    /// Re-watching never shortens an existing watch.
    pub fn watch(
        &mut self,
        watcher: UserId,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        self.prune_expired_watchers(now);
        self.merge_watch(watcher, until)
    }

    /// Removes `watcher`'s entry. Returns whether one was present.
    pub fn unwatch(&mut self, watcher: &UserId) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|entry| &entry.watcher != watcher);
        self.watchers.len() != before
    }

    /// Removes every entry whose expiry is before `now`; returns how many.
    pub fn prune_expired_watchers(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.watchers.len();
        self.watchers.retain(|entry| !entry.is_expired(now));
        before - self.watchers.len()
    }

    /// Prunes, then empties the watcher set, returning the survivors.
    pub fn take_watchers(&mut self, now: DateTime<Utc>) -> Vec<WatchEntry> {
        self.prune_expired_watchers(now);
        std::mem::take(&mut self.watchers)
    }

    fn merge_watch(&mut self, watcher: UserId, until: DateTime<Utc>) -> DateTime<Utc> {
        match self.watchers.iter_mut().find(|entry| entry.watcher == watcher) {
            Some(entry) => {
                if until > entry.until {
                    entry.until = until;
                }
                entry.until
            }
            None => {
                self.watchers.push(WatchEntry { watcher, until });
                until
            }
        }
    }
}
