//! Core error types for envlease.
//!
//! [`CoreError`] covers malformed input caught before any lease state is
//! touched: bad identifiers and unparsable durations.

use thiserror::Error;

/// Errors produced while constructing core domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A resource identifier failed validation.
    #[error("invalid resource id '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    /// A user identity failed validation.
    #[error("invalid user id '{id}': {reason}")]
    InvalidUserId { id: String, reason: String },

    /// A duration string could not be parsed.
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },
}
