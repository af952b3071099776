//! Schema types for reserve, release, watch and unwatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envlease_core::{parse_duration_minutes, CoreError, ResourceId, UserId};

/// Duration used when a request names none (one hour).
pub const DEFAULT_REQUEST_MINUTES: i64 = 60;

/// Body of reserve and watch requests. `minutes` wins over `duration`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DurationRequest {
    pub minutes: Option<i64>,
    /// Human form such as "1h12m".
    pub duration: Option<String>,
}

impl DurationRequest {
    pub fn resolve_minutes(&self) -> Result<i64, CoreError> {
        match (self.minutes, self.duration.as_deref()) {
            (Some(minutes), _) => Ok(minutes),
            (None, Some(text)) => parse_duration_minutes(text),
            (None, None) => Ok(DEFAULT_REQUEST_MINUTES),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReserveResponse {
    pub resource: ResourceId,
    pub holder: UserId,
    pub until: DateTime<Utc>,
    pub notified: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseResponse {
    pub resource: ResourceId,
    pub previous_holder: UserId,
    pub forced: bool,
    pub notified: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchResponse {
    pub resource: ResourceId,
    pub watcher: UserId,
    pub until: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnwatchResponse {
    pub resource: ResourceId,
    pub was_watching: bool,
}
