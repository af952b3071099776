//! HTTP handler modules for the envlease API.
//!
//! Each sub-module implements thin handlers that resolve the caller, parse
//! the request, delegate to the
//! [`ReservationCoordinator`](crate::coordinator::ReservationCoordinator) or
//! [`AdminService`](crate::admin::AdminService), and return JSON responses.
//! No business logic lives in handlers.

pub mod admin;
pub mod leases;
pub mod logs;
pub mod resources;

use envlease_core::{ResourceId, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Validates a `{name}` path segment.
pub(crate) fn resource_id(name: String) -> Result<ResourceId, ApiError> {
    Ok(ResourceId::new(name)?)
}

/// Fails with 403 unless `caller` is an admin.
pub(crate) fn require_admin(state: &AppState, caller: &UserId) -> Result<(), ApiError> {
    if state.authorizer.is_admin(caller)? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("{} is not an admin", caller)))
    }
}
