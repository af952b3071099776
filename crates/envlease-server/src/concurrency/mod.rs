//! Concurrency infrastructure shared by the coordinator and handlers.
//!
//! - [`lock_table::LockTable`] for per-resource critical sections
//! - [`extract_user_id`] for resolving the caller identity of a request

pub mod lock_table;

pub use lock_table::{with_resource_lock, LockTable};

use envlease_core::UserId;

use crate::error::ApiError;

/// Header carrying the caller identity.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Extracts the caller identity from the `X-User-Id` HTTP header.
///
/// Returns `ApiError::Unauthorized` if the header is missing, not UTF-8, or
/// not a valid identity.
pub fn extract_user_id(headers: &axum::http::HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| UserId::new(s).ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("{} header required", USER_ID_HEADER)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_extract_user_id() {
        let mut headers = HeaderMap::new();
        assert!(extract_user_id(&headers).is_err());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" "));
        assert!(extract_user_id(&headers).is_err());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("alice@example.com"));
        assert_eq!(extract_user_id(&headers).unwrap().as_str(), "alice@example.com");
    }
}
