//! Identifier newtypes.
//!
//! Both identifiers are opaque, case-sensitive strings. Validation only
//! rejects values that could never be typed back by a caller: empty
//! strings, surrounding whitespace, and control characters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

fn validate(raw: &str) -> Result<(), &'static str> {
    if raw.is_empty() {
        return Err("must not be empty");
    }
    if raw.trim() != raw {
        return Err("must not have leading or trailing whitespace");
    }
    if raw.chars().any(char::is_control) {
        return Err("must not contain control characters");
    }
    Ok(())
}

/// Unique identifier of a leasable resource (a build environment).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        match validate(&raw) {
            Ok(()) => Ok(ResourceId(raw)),
            Err(reason) => Err(CoreError::InvalidResourceId {
                id: raw,
                reason: reason.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ResourceId::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// Identity of a caller: a lease holder, a watcher, or an admin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        match validate(&raw) {
            Ok(()) => Ok(UserId(raw)),
            Err(reason) => Err(CoreError::InvalidUserId {
                id: raw,
                reason: reason.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}
