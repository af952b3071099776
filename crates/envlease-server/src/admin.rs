//! Privileged operations.
//!
//! [`AdminCommand`] is the closed set of admin actions. [`AdminService`]
//! checks the caller against the [`Authorizer`] once and dispatches with an
//! exhaustive match. The coordinator itself never consults the authorizer;
//! force-release reaches it as a pre-resolved `force = true`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use envlease_core::{AuditEntry, AuditQuery, ResourceId, UserId};
use envlease_storage::{AdminStore, StorageError};

use crate::coordinator::{ReleaseOutcome, ReservationCoordinator};
use crate::error::{ApiError, CoordinatorError};

/// Decides who may run admin commands and force releases.
///
/// Backed by an [`AdminStore`], so grants and dismissals made at runtime
/// survive a restart and are shared with every process on the same database.
pub struct Authorizer {
    store: Arc<dyn AdminStore>,
}

impl Authorizer {
    /// Creates an authorizer and grants every identity in `seed`.
    ///
    /// Seeding is additive: admins granted earlier through
    /// [`AdminCommand::MakeAdmin`] are kept.
    pub fn seeded(
        store: Arc<dyn AdminStore>,
        seed: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, StorageError> {
        for user in seed {
            if store.grant_admin(&user)? {
                tracing::info!(user = %user, "seeded admin");
            }
        }
        Ok(Authorizer { store })
    }

    pub fn is_admin(&self, user: &UserId) -> Result<bool, StorageError> {
        self.store.is_admin(user)
    }

    /// Grants admin. Returns false if `user` already was one.
    pub fn grant(&self, user: &UserId) -> Result<bool, StorageError> {
        self.store.grant_admin(user)
    }

    /// Revokes admin. Returns false if `user` was not one.
    pub fn revoke(&self, user: &UserId) -> Result<bool, StorageError> {
        self.store.revoke_admin(user)
    }

    /// Current admins, sorted.
    pub fn admins(&self) -> Result<Vec<UserId>, StorageError> {
        self.store.list_admins()
    }
}

/// One admin action and its argument.
///
/// Serialized adjacently tagged: `{"action": "force_release", "arg": "env-a"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "arg", rename_all = "snake_case")]
pub enum AdminCommand {
    CreateResource(ResourceId),
    DeleteResource(ResourceId),
    ForceRelease(ResourceId),
    RefreshCache,
    ResourceLog(ResourceId),
    UserLog(UserId),
    MakeAdmin(UserId),
    DismissAdmin(UserId),
}

/// What an admin command did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
    Created {
        resource: ResourceId,
        max_lease_minutes: i64,
    },
    Deleted {
        resource: ResourceId,
    },
    ForceReleased(ReleaseOutcome),
    CacheRefreshed {
        resources: usize,
    },
    ResourceLog {
        resource: ResourceId,
        reservations: Vec<AuditEntry>,
        watches: Vec<AuditEntry>,
    },
    UserLog {
        subject: UserId,
        reservations: Vec<AuditEntry>,
        watches: Vec<AuditEntry>,
    },
    AdminGranted {
        user: UserId,
        changed: bool,
    },
    AdminRevoked {
        user: UserId,
        changed: bool,
    },
}

/// Admin command failures.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{caller} is not an admin")]
    Forbidden { caller: UserId },

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl From<StorageError> for AdminError {
    fn from(err: StorageError) -> Self {
        AdminError::Coordinator(CoordinatorError::StoreUnavailable(err))
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
            AdminError::Coordinator(inner) => ApiError::Coordinator(inner),
        }
    }
}

/// Runs [`AdminCommand`]s against a coordinator on behalf of admins.
#[derive(Clone)]
pub struct AdminService {
    coordinator: Arc<ReservationCoordinator>,
    authorizer: Arc<Authorizer>,
}

impl AdminService {
    pub fn new(coordinator: Arc<ReservationCoordinator>, authorizer: Arc<Authorizer>) -> Self {
        AdminService {
            coordinator,
            authorizer,
        }
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    /// Checks privilege, then executes `command`.
    pub fn execute(
        &self,
        caller: &UserId,
        command: AdminCommand,
    ) -> Result<AdminOutcome, AdminError> {
        if !self.authorizer.is_admin(caller)? {
            tracing::warn!(caller = %caller, ?command, "admin command refused");
            return Err(AdminError::Forbidden {
                caller: caller.clone(),
            });
        }
        tracing::info!(caller = %caller, ?command, "admin command");

        let outcome = match command {
            AdminCommand::CreateResource(resource) => {
                let record = self.coordinator.create_resource(&resource)?;
                AdminOutcome::Created {
                    max_lease_minutes: record.max_lease_minutes(),
                    resource,
                }
            }
            AdminCommand::DeleteResource(resource) => {
                self.coordinator.delete_resource(&resource)?;
                AdminOutcome::Deleted { resource }
            }
            AdminCommand::ForceRelease(resource) => {
                AdminOutcome::ForceReleased(self.coordinator.release(&resource, caller, true)?)
            }
            AdminCommand::RefreshCache => AdminOutcome::CacheRefreshed {
                resources: self.coordinator.refresh_cache()?,
            },
            AdminCommand::ResourceLog(resource) => {
                let query = AuditQuery::for_resource(resource.clone());
                AdminOutcome::ResourceLog {
                    reservations: self.coordinator.reservation_log(&query)?,
                    watches: self.coordinator.watch_log(&query)?,
                    resource,
                }
            }
            AdminCommand::UserLog(subject) => {
                let query = AuditQuery::for_subject(subject.clone());
                AdminOutcome::UserLog {
                    reservations: self.coordinator.reservation_log(&query)?,
                    watches: self.coordinator.watch_log(&query)?,
                    subject,
                }
            }
            AdminCommand::MakeAdmin(user) => AdminOutcome::AdminGranted {
                changed: self.authorizer.grant(&user)?,
                user,
            },
            AdminCommand::DismissAdmin(user) => AdminOutcome::AdminRevoked {
                changed: self.authorizer.revoke(&user)?,
                user,
            },
        };
        Ok(outcome)
    }
}
