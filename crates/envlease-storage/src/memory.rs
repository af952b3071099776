//! In-memory implementation of [`LeaseStore`], [`AuditLog`] and
//! [`AdminStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and anywhere
//! persistence isn't needed. Semantics match the SQLite backend, including
//! audit ordering and id assignment.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};

use envlease_core::{AuditEntry, AuditKind, AuditQuery, LeaseRecord, ResourceId, UserId};

use crate::error::StorageError;
use crate::traits::{AdminStore, AuditLog, LeaseStore};

/// One append-only history with its own id sequence.
#[derive(Debug, Default)]
struct History {
    entries: Vec<AuditEntry>,
    next_id: i64,
}

impl History {
    fn latest(&self, resource: &ResourceId, subject: &UserId) -> Option<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| &e.resource == resource && &e.subject == subject)
            .max_by_key(|e| (e.start, e.id))
    }
}

/// In-memory implementation of [`LeaseStore`] and [`AuditLog`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<ResourceId, LeaseRecord>>,
    reservations: Mutex<History>,
    watches: Mutex<History>,
    admins: RwLock<BTreeSet<UserId>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn history(&self, kind: AuditKind) -> std::sync::MutexGuard<'_, History> {
        let history = match kind {
            AuditKind::Reservation => &self.reservations,
            AuditKind::Watch => &self.watches,
        };
        history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LeaseStore for InMemoryStore {
    fn get(&self, id: &ResourceId) -> Result<Option<LeaseRecord>, StorageError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(id).cloned())
    }

    fn put(&self, record: &LeaseRecord) -> Result<(), StorageError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(record.name().clone(), record.clone());
        Ok(())
    }

    fn delete(&self, id: &ResourceId) -> Result<bool, StorageError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        Ok(records.remove(id).is_some())
    }

    fn list_all_ids(&self) -> Result<Vec<ResourceId>, StorageError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.keys().cloned().collect())
    }

    fn list_all(&self) -> Result<Vec<LeaseRecord>, StorageError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.values().cloned().collect())
    }
}

impl AdminStore for InMemoryStore {
    fn is_admin(&self, user: &UserId) -> Result<bool, StorageError> {
        let admins = self.admins.read().unwrap_or_else(|e| e.into_inner());
        Ok(admins.contains(user))
    }

    fn grant_admin(&self, user: &UserId) -> Result<bool, StorageError> {
        let mut admins = self.admins.write().unwrap_or_else(|e| e.into_inner());
        Ok(admins.insert(user.clone()))
    }

    fn revoke_admin(&self, user: &UserId) -> Result<bool, StorageError> {
        let mut admins = self.admins.write().unwrap_or_else(|e| e.into_inner());
        Ok(admins.remove(user))
    }

    fn list_admins(&self) -> Result<Vec<UserId>, StorageError> {
        let admins = self.admins.read().unwrap_or_else(|e| e.into_inner());
        Ok(admins.iter().cloned().collect())
    }
}

impl AuditLog for InMemoryStore {
    fn append(
        &self,
        kind: AuditKind,
        resource: &ResourceId,
        subject: &UserId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<AuditEntry, StorageError> {
        let mut history = self.history(kind);
        history.next_id += 1;
        let entry = AuditEntry {
            id: history.next_id,
            kind,
            resource: resource.clone(),
            subject: subject.clone(),
            start,
            end,
        };
        history.entries.push(entry.clone());
        Ok(entry)
    }

    fn latest(
        &self,
        kind: AuditKind,
        resource: &ResourceId,
        subject: &UserId,
    ) -> Result<Option<AuditEntry>, StorageError> {
        Ok(self.history(kind).latest(resource, subject).cloned())
    }

    fn set_end(&self, kind: AuditKind, id: i64, end: DateTime<Utc>) -> Result<(), StorageError> {
        let mut history = self.history(kind);
        if let Some(entry) = history.entries.iter_mut().find(|e| e.id == id) {
            entry.end = Some(end);
        }
        Ok(())
    }

    fn query(&self, kind: AuditKind, query: &AuditQuery) -> Result<Vec<AuditEntry>, StorageError> {
        let history = self.history(kind);
        let mut matched: Vec<AuditEntry> = history
            .entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| (b.start, b.id).cmp(&(a.start, a.id)));
        Ok(matched)
    }
}
