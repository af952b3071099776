//! The [`LeaseStore`], [`AuditLog`] and [`AdminStore`] traits.
//!
//! Both traits take `&self` and are `Send + Sync`: backends handle their own
//! interior locking so a single store can be shared across worker threads.
//! Neither trait serializes multi-call sequences; callers that read, decide
//! and write must hold their own per-resource lock around the sequence.

use chrono::{DateTime, Utc};

use envlease_core::{AuditEntry, AuditKind, AuditQuery, LeaseRecord, ResourceId, UserId};

use crate::error::StorageError;

/// Authoritative storage of one [`LeaseRecord`] per resource.
pub trait LeaseStore: Send + Sync {
    /// Loads a record, or `None` if the resource does not exist.
    fn get(&self, id: &ResourceId) -> Result<Option<LeaseRecord>, StorageError>;

    /// Inserts or overwrites a record.
    fn put(&self, record: &LeaseRecord) -> Result<(), StorageError>;

    /// Deletes a record. Returns whether it existed.
    fn delete(&self, id: &ResourceId) -> Result<bool, StorageError>;

    /// Lists every stored identifier, sorted.
    fn list_all_ids(&self) -> Result<Vec<ResourceId>, StorageError>;

    /// Loads every stored record, sorted by identifier.
    fn list_all(&self) -> Result<Vec<LeaseRecord>, StorageError>;
}

/// The persisted set of identities holding admin privilege.
pub trait AdminStore: Send + Sync {
    fn is_admin(&self, user: &UserId) -> Result<bool, StorageError>;

    /// Adds `user`. Returns false if it already was an admin.
    fn grant_admin(&self, user: &UserId) -> Result<bool, StorageError>;

    /// Removes `user`. Returns false if it was not an admin.
    fn revoke_admin(&self, user: &UserId) -> Result<bool, StorageError>;

    /// Every admin, sorted.
    fn list_admins(&self) -> Result<Vec<UserId>, StorageError>;
}

/// Append-only reservation and watch histories.
///
/// Backends implement four primitives; the open/close operations are
/// provided on top of them. The provided methods read then write, so callers
/// must serialize them per resource (the coordinator calls them under its
/// resource lock).
pub trait AuditLog: Send + Sync {
    /// Appends a new entry and returns it with its assigned id.
    fn append(
        &self,
        kind: AuditKind,
        resource: &ResourceId,
        subject: &UserId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<AuditEntry, StorageError>;

    /// The most recently started entry for the pair, if any.
    fn latest(
        &self,
        kind: AuditKind,
        resource: &ResourceId,
        subject: &UserId,
    ) -> Result<Option<AuditEntry>, StorageError>;

    /// Overwrites the end timestamp of entry `id`.
    fn set_end(&self, kind: AuditKind, id: i64, end: DateTime<Utc>) -> Result<(), StorageError>;

    /// Entries matching `query`, most recent first.
    fn query(&self, kind: AuditKind, query: &AuditQuery) -> Result<Vec<AuditEntry>, StorageError>;

    // -------------------------------------------------------------------
    // Provided operations
    // -------------------------------------------------------------------

    fn open_reservation(
        &self,
        resource: &ResourceId,
        subject: &UserId,
        start: DateTime<Utc>,
        planned_end: DateTime<Utc>,
    ) -> Result<AuditEntry, StorageError> {
        self.append(AuditKind::Reservation, resource, subject, start, Some(planned_end))
    }

    fn close_reservation(
        &self,
        resource: &ResourceId,
        subject: &UserId,
        actual_end: DateTime<Utc>,
    ) -> Result<Option<AuditEntry>, StorageError> {
        self.close(AuditKind::Reservation, resource, subject, actual_end)
    }

    /// Opens a watch entry, or extends the current one if it is still open
    /// at `start`. Extension never shortens the recorded end.
    fn open_watch(
        &self,
        resource: &ResourceId,
        subject: &UserId,
        start: DateTime<Utc>,
        planned_end: DateTime<Utc>,
    ) -> Result<AuditEntry, StorageError> {
        match self.latest(AuditKind::Watch, resource, subject)? {
            Some(mut current) if current.is_open_at(start) => {
                let end = current.end.map_or(planned_end, |end| end.max(planned_end));
                self.set_end(AuditKind::Watch, current.id, end)?;
                current.end = Some(end);
                Ok(current)
            }
            _ => self.append(AuditKind::Watch, resource, subject, start, Some(planned_end)),
        }
    }

    fn close_watch(
        &self,
        resource: &ResourceId,
        subject: &UserId,
        actual_end: DateTime<Utc>,
    ) -> Result<Option<AuditEntry>, StorageError> {
        self.close(AuditKind::Watch, resource, subject, actual_end)
    }

    /// Closes the pair's most recent entry if it is still open at `at`.
    /// Closing with nothing open is a no-op returning `None`.
    fn close(
        &self,
        kind: AuditKind,
        resource: &ResourceId,
        subject: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditEntry>, StorageError> {
        match self.latest(kind, resource, subject)? {
            Some(mut current) if current.is_open_at(at) => {
                self.set_end(kind, current.id, at)?;
                current.end = Some(at);
                Ok(Some(current))
            }
            _ => Ok(None),
        }
    }
}
