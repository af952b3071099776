//! Application state shared by all handlers.
//!
//! [`AppState`] is cheap to clone: every field is an `Arc`. The coordinator
//! is synchronous and does its own per-resource locking, so handlers call it
//! directly without an outer async mutex.

use std::sync::Arc;

use envlease_core::{Clock, SystemClock};
use envlease_storage::{InMemoryStore, SqliteStore};

use crate::admin::{AdminService, Authorizer};
use crate::config::{CoordinatorConfig, ServerConfig};
use crate::coordinator::ReservationCoordinator;
use crate::error::ApiError;
use crate::notify::{NotificationDispatcher, TracingNotifier, WebhookNotifier};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Lease coordinator over the configured store.
    pub coordinator: Arc<ReservationCoordinator>,
    /// Persisted admin identities, consulted for force releases and admin
    /// commands.
    pub authorizer: Arc<Authorizer>,
    /// Dispatcher for [`AdminCommand`](crate::admin::AdminCommand)s.
    pub admin: AdminService,
}

impl AppState {
    /// Creates state backed by the SQLite database in `config.db_path`.
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let store = Arc::new(SqliteStore::new(&config.db_path)?);
        let authorizer = Authorizer::seeded(store.clone(), config.admins.clone())?;
        let notifier: Arc<dyn NotificationDispatcher> = match &config.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => Arc::new(TracingNotifier),
        };
        let coordinator = ReservationCoordinator::from_backend(
            store,
            notifier,
            Arc::new(SystemClock),
            config.coordinator.clone(),
        )?;
        Ok(Self::assemble(coordinator, authorizer))
    }

    /// Creates state with an in-memory store (for testing).
    pub fn in_memory(
        admins: Vec<envlease_core::UserId>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ApiError> {
        let store = Arc::new(InMemoryStore::new());
        let authorizer = Authorizer::seeded(store.clone(), admins)?;
        let coordinator = ReservationCoordinator::from_backend(
            store,
            notifier,
            clock,
            CoordinatorConfig::default(),
        )?;
        Ok(Self::assemble(coordinator, authorizer))
    }

    fn assemble(coordinator: ReservationCoordinator, authorizer: Authorizer) -> Self {
        let coordinator = Arc::new(coordinator);
        let authorizer = Arc::new(authorizer);
        let admin = AdminService::new(Arc::clone(&coordinator), Arc::clone(&authorizer));
        AppState {
            coordinator,
            authorizer,
            admin,
        }
    }
}
