//! Resource management and query handlers.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::concurrency::extract_user_id;
use crate::coordinator::{ResourceFilter, ResourceView};
use crate::error::ApiError;
use crate::handlers::{require_admin, resource_id};
use crate::schema::resources::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceResponse, ListResourcesQuery,
    ListResourcesResponse, StatusResponse,
};
use crate::state::AppState;

/// `GET /resources?filter=&prefix=`
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<Json<ListResourcesResponse>, ApiError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => raw.parse::<ResourceFilter>().map_err(ApiError::BadRequest)?,
        None => ResourceFilter::All,
    };
    let resources = state
        .coordinator
        .list_resources(filter, query.prefix.as_deref())?;
    Ok(Json(ListResourcesResponse { resources }))
}

/// `POST /resources` (admin)
pub async fn create_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateResourceRequest>,
) -> Result<Json<CreateResourceResponse>, ApiError> {
    let caller = extract_user_id(&headers)?;
    let name = resource_id(req.name)?;

    require_admin(&state, &caller)?;

    let record = state.coordinator.create_resource(&name)?;
    Ok(Json(CreateResourceResponse {
        name,
        max_lease_minutes: record.max_lease_minutes(),
    }))
}

/// `DELETE /resources/{name}` (admin)
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteResourceResponse>, ApiError> {
    let caller = extract_user_id(&headers)?;
    let name = resource_id(name)?;

    require_admin(&state, &caller)?;

    state.coordinator.delete_resource(&name)?;
    Ok(Json(DeleteResourceResponse {
        name,
        deleted: true,
    }))
}

/// `GET /resources/{name}`
pub async fn describe_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceView>, ApiError> {
    let name = resource_id(name)?;
    Ok(Json(state.coordinator.describe(&name)?))
}

/// `GET /resources/{name}/status`
pub async fn resource_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let name = resource_id(name)?;
    let status = state.coordinator.status(&name)?;
    Ok(Json(StatusResponse { name, status }))
}
