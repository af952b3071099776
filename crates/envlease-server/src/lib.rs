//! Lease coordination service for shared build environments.
//!
//! The [`coordinator::ReservationCoordinator`] serializes reserve, release,
//! watch and unwatch per resource, persists through `envlease-storage`, and
//! notifies watchers after each transition commits. Around it this crate
//! provides the existence cache, admin command dispatch, configuration, and
//! an HTTP/JSON API built on axum.

pub mod admin;
pub mod cache;
pub mod concurrency;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod router;
pub mod schema;
pub mod state;

/// Initializes `tracing` with `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
