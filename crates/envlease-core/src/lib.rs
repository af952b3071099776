//! Core domain types for envlease: time-bounded exclusive leases on named
//! build environments, with passive watchers notified on release.
//!
//! This crate is pure data and state transitions. It performs no I/O and
//! takes no locks; persistence and serialization of concurrent callers are
//! the job of `envlease-storage` and `envlease-server`.
//!
//! # Modules
//!
//! - [`id`]: [`ResourceId`] and [`UserId`] validated string newtypes
//! - [`lease`]: [`LeaseRecord`], the per-resource lease/watch state machine
//! - [`audit`]: [`AuditEntry`] history records and [`AuditQuery`] filters
//! - [`clock`]: the injectable [`Clock`] used for every expiry decision
//! - [`duration`]: parsing of human duration strings such as `1h12m`
//! - [`error`]: [`CoreError`]

pub mod audit;
pub mod clock;
pub mod duration;
pub mod error;
pub mod id;
pub mod lease;

pub use audit::{AuditEntry, AuditKind, AuditQuery};
pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::{format_minutes, parse_duration_minutes};
pub use error::CoreError;
pub use id::{ResourceId, UserId};
pub use lease::{Lease, LeaseRecord, LeaseStatus, WatchEntry, DEFAULT_MAX_LEASE_MINUTES};
