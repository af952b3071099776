//! Storage abstraction for envlease lease records and audit history.
//!
//! Provides the [`LeaseStore`], [`AuditLog`] and [`AdminStore`] traits
//! defining the storage contract that all backends implement, plus the
//! [`InMemoryStore`] and [`SqliteStore`] as first-class backends. Each
//! backend implements all three traits so a single value can be shared as
//! `Arc<dyn LeaseStore>`, `Arc<dyn AuditLog>` and `Arc<dyn AdminStore>`.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`traits`]: LeaseStore, AuditLog and AdminStore trait definitions
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: SQL schema migrations and connection setup
//! - [`sqlite`]: SqliteStore implementation

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{AdminStore, AuditLog, LeaseStore};
