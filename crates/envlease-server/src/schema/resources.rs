//! Schema types for resource management and listing.

use serde::{Deserialize, Serialize};

use envlease_core::{LeaseStatus, ResourceId};

use crate::coordinator::ResourceView;

/// Request to create a resource.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateResourceRequest {
    pub name: String,
}

/// Response after creating a resource.
#[derive(Debug, Clone, Serialize)]
pub struct CreateResourceResponse {
    pub name: ResourceId,
    pub max_lease_minutes: i64,
}

/// Response after deleting a resource.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResourceResponse {
    pub name: ResourceId,
    pub deleted: bool,
}

/// Query string for `GET /resources`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResourcesQuery {
    /// "all" (default), "reserved" or "available".
    pub filter: Option<String>,
    /// Keep only names starting with this string.
    pub prefix: Option<String>,
}

/// Response listing resources.
#[derive(Debug, Clone, Serialize)]
pub struct ListResourcesResponse {
    pub resources: Vec<ResourceView>,
}

/// Response for `GET /resources/{name}/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub name: ResourceId,
    #[serde(flatten)]
    pub status: LeaseStatus,
}
