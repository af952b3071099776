//! Schema types for the admin endpoint.
//!
//! The request body is an [`AdminCommand`](crate::admin::AdminCommand)
//! deserialized directly; the response wraps the typed outcome.

use serde::Serialize;

use crate::admin::AdminOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct AdminResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: AdminOutcome,
}
