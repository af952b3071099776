//! Audit history handlers.

use axum::extract::{Query, State};
use axum::Json;

use envlease_core::{AuditQuery, ResourceId, UserId};

use crate::error::ApiError;
use crate::schema::logs::{LogQuery, LogResponse};
use crate::state::AppState;

fn audit_query(query: LogQuery) -> Result<AuditQuery, ApiError> {
    Ok(AuditQuery {
        resource: query.resource.map(ResourceId::new).transpose()?,
        subject: query.subject.map(UserId::new).transpose()?,
    })
}

/// `GET /logs/reservations?resource=&subject=`
pub async fn reservation_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogResponse>, ApiError> {
    let entries = state.coordinator.reservation_log(&audit_query(query)?)?;
    Ok(Json(LogResponse { entries }))
}

/// `GET /logs/watches?resource=&subject=`
pub async fn watch_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogResponse>, ApiError> {
    let entries = state.coordinator.watch_log(&audit_query(query)?)?;
    Ok(Json(LogResponse { entries }))
}
