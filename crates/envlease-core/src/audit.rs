//! Audit history records.
//!
//! Two independent append-only histories exist: reservations and watches.
//! An entry carries its planned end when opened; closing it overwrites the
//! end with the actual time. An entry is "open" at instant `t` while its end
//! is unset or still after `t`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ResourceId, UserId};

/// Which history an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Reservation,
    Watch,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Reservation => "reservation",
            AuditKind::Watch => "watch",
        }
    }
}

/// One history row: `subject` reserved or watched `resource` over
/// `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Backend-assigned, monotonically increasing within a kind.
    pub id: i64,
    pub kind: AuditKind,
    pub resource: ResourceId,
    pub subject: UserId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl AuditEntry {
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        self.end.map_or(true, |end| end > at)
    }
}

/// Optional filters for history queries. An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditQuery {
    pub resource: Option<ResourceId>,
    pub subject: Option<UserId>,
}

impl AuditQuery {
    pub fn for_resource(resource: ResourceId) -> Self {
        AuditQuery {
            resource: Some(resource),
            subject: None,
        }
    }

    pub fn for_subject(subject: UserId) -> Self {
        AuditQuery {
            resource: None,
            subject: Some(subject),
        }
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.resource.as_ref().map_or(true, |r| r == &entry.resource)
            && self.subject.as_ref().map_or(true, |s| s == &entry.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(end: Option<DateTime<Utc>>) -> AuditEntry {
        AuditEntry {
            id: 1,
            kind: AuditKind::Reservation,
            resource: ResourceId::new("env-a").unwrap(),
            subject: UserId::new("alice").unwrap(),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end,
        }
    }

    #[test]
    fn test_open_until_end() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let e = entry(Some(start + Duration::minutes(10)));
        assert!(e.is_open_at(start + Duration::minutes(9)));
        assert!(!e.is_open_at(start + Duration::minutes(10)));
        assert!(entry(None).is_open_at(start + Duration::days(365)));
    }

    #[test]
    fn test_query_filters() {
        let e = entry(None);
        assert!(AuditQuery::default().matches(&e));
        assert!(AuditQuery::for_resource(ResourceId::new("env-a").unwrap()).matches(&e));
        assert!(!AuditQuery::for_resource(ResourceId::new("env-b").unwrap()).matches(&e));
        assert!(!AuditQuery::for_subject(UserId::new("bob").unwrap()).matches(&e));
    }
}
