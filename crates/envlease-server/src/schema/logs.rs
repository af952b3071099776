//! Schema types for audit history queries.

use serde::{Deserialize, Serialize};

use envlease_core::AuditEntry;

/// Query string for `GET /logs/*`. Both filters are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    pub resource: Option<String>,
    pub subject: Option<String>,
}

/// Entries, most recent first.
#[derive(Debug, Clone, Serialize)]
pub struct LogResponse {
    pub entries: Vec<AuditEntry>,
}
