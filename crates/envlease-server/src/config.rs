//! Coordinator and server configuration.
//!
//! Reads configuration from environment variables:
//! - `ENVLEASE_DB_PATH`: SQLite database file path (default: "envlease.db")
//! - `ENVLEASE_PORT`: Server listen port (default: "3000")
//! - `ENVLEASE_CACHE_REFRESH_THRESHOLD`: existence cache refresh threshold (default: 500)
//! - `ENVLEASE_MAX_LEASE_MINUTES`: lease ceiling for newly created resources (default: 1440)
//! - `ENVLEASE_ADMINS`: comma-separated admin identities (default: none)
//! - `ENVLEASE_WEBHOOK_URL`: watcher notification endpoint (default: log only)

use envlease_core::{UserId, DEFAULT_MAX_LEASE_MINUTES};

/// Lookups between forced existence-cache rebuilds.
pub const DEFAULT_CACHE_REFRESH_THRESHOLD: usize = 500;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Library-level settings for a [`ReservationCoordinator`](crate::coordinator::ReservationCoordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub cache_refresh_threshold: usize,
    pub default_max_lease_minutes: i64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            cache_refresh_threshold: DEFAULT_CACHE_REFRESH_THRESHOLD,
            default_max_lease_minutes: DEFAULT_MAX_LEASE_MINUTES,
        }
    }
}

/// Everything the server binary needs, read once at start-up.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: String,
    pub port: u16,
    pub coordinator: CoordinatorConfig,
    pub admins: Vec<UserId>,
    pub webhook_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: "envlease.db".to_string(),
            port: 3000,
            coordinator: CoordinatorConfig::default(),
            admins: Vec::new(),
            webhook_url: None,
        }
    }
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset and empty values
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = ServerConfig::default();

        let port = match get("ENVLEASE_PORT") {
            Some(v) => parse_number("ENVLEASE_PORT", &v)?,
            None => defaults.port,
        };
        let cache_refresh_threshold = match get("ENVLEASE_CACHE_REFRESH_THRESHOLD") {
            Some(v) => parse_number::<usize>("ENVLEASE_CACHE_REFRESH_THRESHOLD", &v)?,
            None => DEFAULT_CACHE_REFRESH_THRESHOLD,
        };
        if cache_refresh_threshold == 0 {
            return Err(ConfigError::Invalid {
                var: "ENVLEASE_CACHE_REFRESH_THRESHOLD",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let default_max_lease_minutes = match get("ENVLEASE_MAX_LEASE_MINUTES") {
            Some(v) => parse_number::<i64>("ENVLEASE_MAX_LEASE_MINUTES", &v)?,
            None => DEFAULT_MAX_LEASE_MINUTES,
        };
        if default_max_lease_minutes <= 0 {
            return Err(ConfigError::Invalid {
                var: "ENVLEASE_MAX_LEASE_MINUTES",
                value: default_max_lease_minutes.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let admins = match get("ENVLEASE_ADMINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    UserId::new(s).map_err(|e| ConfigError::Invalid {
                        var: "ENVLEASE_ADMINS",
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(ServerConfig {
            db_path: get("ENVLEASE_DB_PATH").unwrap_or(defaults.db_path),
            port,
            coordinator: CoordinatorConfig {
                cache_refresh_threshold,
                default_max_lease_minutes,
            },
            admins,
            webhook_url: get("ENVLEASE_WEBHOOK_URL"),
        })
    }
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
