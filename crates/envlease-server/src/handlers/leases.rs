//! Reserve, release, watch and unwatch handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::concurrency::extract_user_id;
use crate::error::ApiError;
use crate::handlers::{require_admin, resource_id};
use crate::schema::leases::{
    DurationRequest, ReleaseRequest, ReleaseResponse, ReserveResponse, UnwatchResponse,
    WatchResponse,
};
use crate::state::AppState;

/// `POST /resources/{name}/reserve`
pub async fn reserve(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Option<Json<DurationRequest>>,
) -> Result<Json<ReserveResponse>, ApiError> {
    let caller = extract_user_id(&headers)?;
    let name = resource_id(name)?;
    let minutes = body.map(|Json(req)| req).unwrap_or_default().resolve_minutes()?;

    let granted = state.coordinator.reserve(&name, &caller, minutes)?;
    Ok(Json(ReserveResponse {
        resource: granted.resource,
        holder: granted.holder,
        until: granted.until,
        notified: granted.notified,
    }))
}

/// `POST /resources/{name}/release`
///
/// `force` is honored only for admins; anyone else gets 403.
pub async fn release(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ReleaseRequest>>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let caller = extract_user_id(&headers)?;
    let name = resource_id(name)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    if req.force {
        require_admin(&state, &caller)?;
    }

    let outcome = state.coordinator.release(&name, &caller, req.force)?;
    Ok(Json(ReleaseResponse {
        resource: outcome.resource,
        previous_holder: outcome.previous_holder,
        forced: outcome.forced,
        notified: outcome.notified,
    }))
}

/// `POST /resources/{name}/watch`
pub async fn watch(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Option<Json<DurationRequest>>,
) -> Result<Json<WatchResponse>, ApiError> {
    let caller = extract_user_id(&headers)?;
    let name = resource_id(name)?;
    let minutes = body.map(|Json(req)| req).unwrap_or_default().resolve_minutes()?;

    let until = state.coordinator.watch(&name, &caller, minutes)?;
    Ok(Json(WatchResponse {
        resource: name,
        watcher: caller,
        until,
    }))
}

/// `POST /resources/{name}/unwatch`
pub async fn unwatch(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UnwatchResponse>, ApiError> {
    let caller = extract_user_id(&headers)?;
    let name = resource_id(name)?;

    let was_watching = state.coordinator.unwatch(&name, &caller)?;
    Ok(Json(UnwatchResponse {
        resource: name,
        was_watching,
    }))
}
