//! Coordinator and API error types.
//!
//! [`CoordinatorError`] is the typed failure taxonomy returned by every
//! [`ReservationCoordinator`](crate::coordinator::ReservationCoordinator)
//! operation. Each variant carries enough data (current holder, expiry,
//! policy maximum) for a transport to render a precise message without
//! querying again.
//!
//! [`ApiError`] is the unified error type for HTTP endpoints. It implements
//! `axum::response::IntoResponse` to produce structured JSON error responses
//! with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use envlease_core::{format_minutes, CoreError, ResourceId, UserId};
use envlease_storage::StorageError;

/// Failures of coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("resource '{0}' not found")]
    NotFound(ResourceId),

    #[error("invalid duration: {minutes} minutes (must be positive)")]
    InvalidDuration { minutes: i64 },

    #[error("duration of {requested} minutes exceeds the maximum of {}", format_minutes(*.max))]
    DurationExceedsPolicy { requested: i64, max: i64 },

    #[error("resource '{resource}' is already reserved by {holder} until {until}")]
    AlreadyReserved {
        resource: ResourceId,
        holder: UserId,
        until: DateTime<Utc>,
    },

    #[error("resource '{0}' is not reserved by anyone")]
    NotReserved(ResourceId),

    #[error("resource '{resource}' is reserved by {holder} until {until}")]
    NotHolder {
        resource: ResourceId,
        holder: UserId,
        until: DateTime<Utc>,
    },

    #[error("resource '{0}' already exists")]
    AlreadyExists(ResourceId),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
}

impl CoordinatorError {
    /// Whether a caller may retry the same call. Only infrastructure faults
    /// qualify; domain rule violations will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoordinatorError::StoreUnavailable(_))
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::NotFound(_) => "NOT_FOUND",
            CoordinatorError::InvalidDuration { .. } => "INVALID_DURATION",
            CoordinatorError::DurationExceedsPolicy { .. } => "DURATION_EXCEEDS_POLICY",
            CoordinatorError::AlreadyReserved { .. } => "ALREADY_RESERVED",
            CoordinatorError::NotReserved(_) => "NOT_RESERVED",
            CoordinatorError::NotHolder { .. } => "NOT_HOLDER",
            CoordinatorError::AlreadyExists(_) => "ALREADY_EXISTS",
            CoordinatorError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Structured details for display, if the variant carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CoordinatorError::AlreadyReserved {
                resource,
                holder,
                until,
            }
            | CoordinatorError::NotHolder {
                resource,
                holder,
                until,
            } => Some(serde_json::json!({
                "resource": resource,
                "holder": holder,
                "until": until,
            })),
            CoordinatorError::DurationExceedsPolicy { requested, max } => {
                Some(serde_json::json!({ "requested": requested, "max": max }))
            }
            CoordinatorError::InvalidDuration { minutes } => {
                Some(serde_json::json!({ "minutes": minutes }))
            }
            CoordinatorError::NotFound(resource)
            | CoordinatorError::NotReserved(resource)
            | CoordinatorError::AlreadyExists(resource) => {
                Some(serde_json::json!({ "resource": resource }))
            }
            CoordinatorError::StoreUnavailable(_) => None,
        }
    }
}

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ALREADY_RESERVED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details (holder, expiry, policy maximum).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A coordinator operation failed; status depends on the variant.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing caller identity (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks admin privilege (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, ApiErrorDetail) {
        let simple = |status: StatusCode, code: &str, message: &str| {
            (
                status,
                ApiErrorDetail {
                    code: code.to_string(),
                    message: message.to_string(),
                    details: None,
                },
            )
        };

        match self {
            ApiError::Coordinator(err) => {
                let status = match err {
                    CoordinatorError::NotFound(_) => StatusCode::NOT_FOUND,
                    CoordinatorError::InvalidDuration { .. }
                    | CoordinatorError::DurationExceedsPolicy { .. } => StatusCode::BAD_REQUEST,
                    CoordinatorError::AlreadyReserved { .. }
                    | CoordinatorError::NotReserved(_)
                    | CoordinatorError::NotHolder { .. }
                    | CoordinatorError::AlreadyExists(_) => StatusCode::CONFLICT,
                    CoordinatorError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (
                    status,
                    ApiErrorDetail {
                        code: err.code().to_string(),
                        message: err.to_string(),
                        details: err.details(),
                    },
                )
            }
            ApiError::BadRequest(msg) => simple(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => simple(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => simple(StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::InternalError(msg) => {
                simple(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Coordinator(CoordinatorError::StoreUnavailable(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_only_store_failures_are_retryable() {
        let store = CoordinatorError::StoreUnavailable(StorageError::Migration("boom".into()));
        assert!(store.is_retryable());
        assert!(!CoordinatorError::InvalidDuration { minutes: 0 }.is_retryable());
        assert!(!CoordinatorError::NotReserved(ResourceId::new("env-a").unwrap()).is_retryable());
    }

    #[test]
    fn test_already_reserved_maps_to_conflict_with_holder() {
        let until = Utc.with_ymd_and_hms(2024, 7, 15, 11, 0, 0).unwrap();
        let err = ApiError::from(CoordinatorError::AlreadyReserved {
            resource: ResourceId::new("env-a").unwrap(),
            holder: UserId::new("alice").unwrap(),
            until,
        });
        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(detail.code, "ALREADY_RESERVED");
        let details = detail.details.unwrap();
        assert_eq!(details["holder"], "alice");
        assert_eq!(details["resource"], "env-a");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CoordinatorError::NotFound(ResourceId::new("x").unwrap()),
                StatusCode::NOT_FOUND,
            ),
            (
                CoordinatorError::DurationExceedsPolicy {
                    requested: 1441,
                    max: 1440,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                CoordinatorError::AlreadyExists(ResourceId::new("x").unwrap()),
                StatusCode::CONFLICT,
            ),
            (
                CoordinatorError::StoreUnavailable(StorageError::Migration("m".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            let (status, _) = ApiError::from(err).status_and_detail();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_policy_message_uses_hours() {
        let err = CoordinatorError::DurationExceedsPolicy {
            requested: 1500,
            max: 1440,
        };
        assert_eq!(
            err.to_string(),
            "duration of 1500 minutes exceeds the maximum of 24h"
        );
    }
}
