//! SQLite implementation of [`LeaseStore`], [`AuditLog`] and [`AdminStore`].
//!
//! [`SqliteStore`] persists lease records and audit history in a SQLite
//! database with WAL mode and automatic schema migrations. The watcher set
//! is stored as a JSON TEXT column via serde_json.
//!
//! `rusqlite::Connection` is `!Sync`, so the connection sits behind a mutex.
//! Every trait call takes the mutex for exactly one statement (or one
//! transaction), which keeps the store safe to share across threads.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use envlease_core::{
    AuditEntry, AuditKind, AuditQuery, Lease, LeaseRecord, ResourceId, UserId, WatchEntry,
};

use crate::error::StorageError;
use crate::traits::{AdminStore, AuditLog, LeaseStore};

/// Raw `resources` row before domain validation.
struct ResourceRow {
    name: String,
    reserved_by: Option<String>,
    reserved_until: Option<DateTime<Utc>>,
    watchers_json: String,
    max_lease_minutes: i64,
}

/// Raw audit row before domain validation.
struct AuditRow {
    id: i64,
    resource: String,
    subject: String,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

const RESOURCE_COLUMNS: &str =
    "name, reserved_by, reserved_until, watchers_json, max_lease_minutes";

/// SQLite-backed implementation of [`LeaseStore`], [`AuditLog`] and
/// [`AdminStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn table(kind: AuditKind) -> &'static str {
        match kind {
            AuditKind::Reservation => "reservation_log",
            AuditKind::Watch => "watch_log",
        }
    }

    fn read_resource_row(row: &Row<'_>) -> rusqlite::Result<ResourceRow> {
        Ok(ResourceRow {
            name: row.get(0)?,
            reserved_by: row.get(1)?,
            reserved_until: row.get(2)?,
            watchers_json: row.get(3)?,
            max_lease_minutes: row.get(4)?,
        })
    }

    fn read_audit_row(row: &Row<'_>) -> rusqlite::Result<AuditRow> {
        Ok(AuditRow {
            id: row.get(0)?,
            resource: row.get(1)?,
            subject: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
        })
    }

    fn corrupt(table: &'static str, err: impl std::fmt::Display) -> StorageError {
        StorageError::Corrupt {
            table,
            reason: err.to_string(),
        }
    }

    fn to_record(row: ResourceRow) -> Result<LeaseRecord, StorageError> {
        let name = ResourceId::new(row.name).map_err(|e| Self::corrupt("resources", e))?;
        let lease = match (row.reserved_by, row.reserved_until) {
            (Some(holder), Some(until)) => Some(Lease {
                holder: UserId::new(holder).map_err(|e| Self::corrupt("resources", e))?,
                until,
            }),
            (None, None) => None,
            _ => {
                return Err(Self::corrupt(
                    "resources",
                    format!("half-set lease on '{}'", name),
                ))
            }
        };
        let watchers: Vec<WatchEntry> = serde_json::from_str(&row.watchers_json)?;
        Ok(LeaseRecord::from_parts(
            name,
            lease,
            watchers,
            row.max_lease_minutes,
        ))
    }

    fn to_entry(kind: AuditKind, row: AuditRow) -> Result<AuditEntry, StorageError> {
        let table = Self::table(kind);
        Ok(AuditEntry {
            id: row.id,
            kind,
            resource: ResourceId::new(row.resource).map_err(|e| Self::corrupt(table, e))?,
            subject: UserId::new(row.subject).map_err(|e| Self::corrupt(table, e))?,
            start: row.start,
            end: row.end,
        })
    }
}

impl LeaseStore for SqliteStore {
    fn get(&self, id: &ResourceId) -> Result<Option<LeaseRecord>, StorageError> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM resources WHERE name = ?1", RESOURCE_COLUMNS),
                params![id.as_str()],
                Self::read_resource_row,
            )
            .optional()?;
        row.map(Self::to_record).transpose()
    }

    fn put(&self, record: &LeaseRecord) -> Result<(), StorageError> {
        let watchers_json = serde_json::to_string(record.watchers())?;
        let (reserved_by, reserved_until) = match record.lease() {
            Some(lease) => (Some(lease.holder.as_str()), Some(lease.until)),
            None => (None, None),
        };
        self.conn().execute(
            "INSERT INTO resources (name, reserved_by, reserved_until, watchers_json, max_lease_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(name) DO UPDATE SET
                 reserved_by = excluded.reserved_by,
                 reserved_until = excluded.reserved_until,
                 watchers_json = excluded.watchers_json,
                 max_lease_minutes = excluded.max_lease_minutes",
            params![
                record.name().as_str(),
                reserved_by,
                reserved_until,
                watchers_json,
                record.max_lease_minutes(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &ResourceId) -> Result<bool, StorageError> {
        let removed = self
            .conn()
            .execute("DELETE FROM resources WHERE name = ?1", params![id.as_str()])?;
        Ok(removed > 0)
    }

    fn list_all_ids(&self) -> Result<Vec<ResourceId>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached("SELECT name FROM resources ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        names
            .into_iter()
            .map(|name| ResourceId::new(name).map_err(|e| Self::corrupt("resources", e)))
            .collect()
    }

    fn list_all(&self) -> Result<Vec<LeaseRecord>, StorageError> {
        let rows = {
            let conn = self.conn();
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM resources ORDER BY name",
                RESOURCE_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], Self::read_resource_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(Self::to_record).collect()
    }
}

impl AdminStore for SqliteStore {
    fn is_admin(&self, user: &UserId) -> Result<bool, StorageError> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM admins WHERE user_id = ?1",
                params![user.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn grant_admin(&self, user: &UserId) -> Result<bool, StorageError> {
        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO admins (user_id) VALUES (?1)",
            params![user.as_str()],
        )?;
        Ok(inserted > 0)
    }

    fn revoke_admin(&self, user: &UserId) -> Result<bool, StorageError> {
        let removed = self
            .conn()
            .execute("DELETE FROM admins WHERE user_id = ?1", params![user.as_str()])?;
        Ok(removed > 0)
    }

    fn list_admins(&self) -> Result<Vec<UserId>, StorageError> {
        let names = {
            let conn = self.conn();
            let mut stmt = conn.prepare_cached("SELECT user_id FROM admins ORDER BY user_id")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            names
        };
        names
            .into_iter()
            .map(|name| UserId::new(name).map_err(|e| Self::corrupt("admins", e)))
            .collect()
    }
}

impl AuditLog for SqliteStore {
    fn append(
        &self,
        kind: AuditKind,
        resource: &ResourceId,
        subject: &UserId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<AuditEntry, StorageError> {
        let conn = self.conn();
        conn.execute(
            &format!(
                "INSERT INTO {} (resource, subject, start_at, end_at) VALUES (?1, ?2, ?3, ?4)",
                Self::table(kind)
            ),
            params![resource.as_str(), subject.as_str(), start, end],
        )?;
        Ok(AuditEntry {
            id: conn.last_insert_rowid(),
            kind,
            resource: resource.clone(),
            subject: subject.clone(),
            start,
            end,
        })
    }

    fn latest(
        &self,
        kind: AuditKind,
        resource: &ResourceId,
        subject: &UserId,
    ) -> Result<Option<AuditEntry>, StorageError> {
        let row = self
            .conn()
            .query_row(
                &format!(
                    "SELECT id, resource, subject, start_at, end_at FROM {}
                     WHERE resource = ?1 AND subject = ?2
                     ORDER BY start_at DESC, id DESC LIMIT 1",
                    Self::table(kind)
                ),
                params![resource.as_str(), subject.as_str()],
                Self::read_audit_row,
            )
            .optional()?;
        row.map(|r| Self::to_entry(kind, r)).transpose()
    }

    fn set_end(&self, kind: AuditKind, id: i64, end: DateTime<Utc>) -> Result<(), StorageError> {
        self.conn().execute(
            &format!("UPDATE {} SET end_at = ?1 WHERE id = ?2", Self::table(kind)),
            params![end, id],
        )?;
        Ok(())
    }

    fn query(&self, kind: AuditKind, query: &AuditQuery) -> Result<Vec<AuditEntry>, StorageError> {
        let rows = {
            let conn = self.conn();
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT id, resource, subject, start_at, end_at FROM {}
                 WHERE (?1 IS NULL OR resource = ?1) AND (?2 IS NULL OR subject = ?2)
                 ORDER BY start_at DESC, id DESC",
                Self::table(kind)
            ))?;
            let rows = stmt
                .query_map(
                    params![
                        query.resource.as_ref().map(ResourceId::as_str),
                        query.subject.as_ref().map(UserId::as_str),
                    ],
                    Self::read_audit_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(|r| Self::to_entry(kind, r)).collect()
    }
}
