//! The reservation coordinator.
//!
//! [`ReservationCoordinator`] owns every [`LeaseRecord`] mutation. Each
//! state-changing operation runs as
//!
//! 1. existence check through the [`ExistenceCache`],
//! 2. lock the resource in the [`LockTable`],
//! 3. load, decide, mutate in memory, persist (the commit point),
//! 4. append to the audit log, closing the watch entries of any watchers
//!    the transition cleared (failures logged, never propagated),
//! 5. unlock, then notify watchers concurrently.
//!
//! Status and listing are snapshot reads and take no resource lock.
//! Operations never retry; a [`CoordinatorError::StoreUnavailable`] is
//! returned for the caller to decide.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envlease_core::{
    AuditEntry, AuditKind, AuditQuery, Clock, LeaseRecord, LeaseStatus, ResourceId, UserId,
    WatchEntry,
};
use envlease_storage::{AuditLog, LeaseStore};

use crate::cache::ExistenceCache;
use crate::concurrency::{with_resource_lock, LockTable};
use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::notify::NotificationDispatcher;

/// A granted reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub resource: ResourceId,
    pub holder: UserId,
    pub until: DateTime<Utc>,
    /// Watchers told that the resource was taken.
    pub notified: usize,
}

/// Result of a successful release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseOutcome {
    pub resource: ResourceId,
    pub previous_holder: UserId,
    /// True when the releaser was not the holder.
    pub forced: bool,
    pub notified: usize,
}

/// Which resources a listing includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFilter {
    #[default]
    All,
    Reserved,
    Available,
}

impl ResourceFilter {
    fn admits(self, status: &LeaseStatus) -> bool {
        match self {
            ResourceFilter::All => true,
            ResourceFilter::Reserved => status.is_held(),
            ResourceFilter::Available => !status.is_held(),
        }
    }
}

impl std::str::FromStr for ResourceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ResourceFilter::All),
            "reserved" => Ok(ResourceFilter::Reserved),
            "available" | "free" => Ok(ResourceFilter::Available),
            other => Err(format!(
                "invalid filter '{}': expected all, reserved or available",
                other
            )),
        }
    }
}

/// Read-only view of one resource at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceView {
    pub name: ResourceId,
    pub status: LeaseStatus,
    /// Watchers still in force; expired entries are filtered, not pruned.
    pub watchers: Vec<WatchEntry>,
    pub max_lease_minutes: i64,
}

impl ResourceView {
    fn of(record: &LeaseRecord, now: DateTime<Utc>) -> Self {
        ResourceView {
            name: record.name().clone(),
            status: record.status(now),
            watchers: record.active_watchers(now).cloned().collect(),
            max_lease_minutes: record.max_lease_minutes(),
        }
    }
}

/// Serializes lease transitions per resource and drives audit and
/// notification side effects.
pub struct ReservationCoordinator {
    store: Arc<dyn LeaseStore>,
    audit: Arc<dyn AuditLog>,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    cache: ExistenceCache,
    locks: LockTable,
    config: CoordinatorConfig,
}

impl ReservationCoordinator {
    /// Creates a coordinator and loads its existence cache from `store`.
    pub fn new(
        store: Arc<dyn LeaseStore>,
        audit: Arc<dyn AuditLog>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        let cache = ExistenceCache::new(Arc::clone(&store), config.cache_refresh_threshold)?;
        Ok(ReservationCoordinator {
            store,
            audit,
            notifier,
            clock,
            cache,
            locks: LockTable::new(),
            config,
        })
    }

    /// Creates a coordinator over a backend that is both store and audit log.
    pub fn from_backend<B>(
        backend: Arc<B>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError>
    where
        B: LeaseStore + AuditLog + 'static,
    {
        let store: Arc<dyn LeaseStore> = backend.clone();
        let audit: Arc<dyn AuditLog> = backend;
        Self::new(store, audit, notifier, clock, config)
    }

    pub fn cache(&self) -> &ExistenceCache {
        &self.cache
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Lease operations
    // -----------------------------------------------------------------------

    /// Grants `requester` an exclusive lease for `minutes`.
    ///
    /// Watchers registered before the reservation are notified (once each,
    /// after the lock is released) and the watcher set is cleared.
    pub fn reserve(
        &self,
        resource: &ResourceId,
        requester: &UserId,
        minutes: i64,
    ) -> Result<Reservation, CoordinatorError> {
        let now = self.clock.now();
        self.require_known(resource)?;
        if minutes <= 0 {
            return Err(CoordinatorError::InvalidDuration { minutes });
        }

        let (until, displaced) = with_resource_lock(&self.locks, resource, || {
            let mut record = self.load(resource)?;

            if let Some(lease) = record.active_lease(now) {
                return Err(CoordinatorError::AlreadyReserved {
                    resource: resource.clone(),
                    holder: lease.holder.clone(),
                    until: lease.until,
                });
            }
            if record.clear_if_expired(now) {
                tracing::debug!(resource = %resource, "dropped expired lease");
            }

            let max = record.max_lease_minutes();
            if minutes > max {
                return Err(CoordinatorError::DurationExceedsPolicy {
                    requested: minutes,
                    max,
                });
            }

            let until = expiry(now, minutes)?;
            let displaced = record.acquire(requester.clone(), until, now);
            self.store.put(&record)?;

            if let Err(err) = self.audit.open_reservation(resource, requester, now, until) {
                tracing::warn!(resource = %resource, "failed to record reservation: {}", err);
            }
            self.close_watches(resource, &displaced, now);
            Ok((until, displaced))
        })?;

        tracing::info!(
            resource = %resource,
            holder = %requester,
            until = %until,
            "resource reserved"
        );

        let message = format!(
            "{} reserved \"{}\" until {}.",
            requester,
            resource,
            until.format("%Y-%m-%d %H:%M UTC")
        );
        let notified = self.dispatch(resource, &displaced, &message);

        Ok(Reservation {
            resource: resource.clone(),
            holder: requester.clone(),
            until,
            notified,
        })
    }

    /// Releases the lease on `resource`.
    ///
    /// Only the holder may release unless `force` is set. `force` must
    /// already reflect the caller's privilege; it is trusted as given.
    pub fn release(
        &self,
        resource: &ResourceId,
        requester: &UserId,
        force: bool,
    ) -> Result<ReleaseOutcome, CoordinatorError> {
        let now = self.clock.now();
        self.require_known(resource)?;

        let (previous, watchers) = with_resource_lock(&self.locks, resource, || {
            let mut record = self.load(resource)?;

            let lease = match record.active_lease(now) {
                Some(lease) => lease.clone(),
                None => return Err(CoordinatorError::NotReserved(resource.clone())),
            };
            if &lease.holder != requester && !force {
                return Err(CoordinatorError::NotHolder {
                    resource: resource.clone(),
                    holder: lease.holder,
                    until: lease.until,
                });
            }

            record.release();
            let watchers = record.take_watchers(now);
            self.store.put(&record)?;

            if let Err(err) = self.audit.close_reservation(resource, &lease.holder, now) {
                tracing::warn!(resource = %resource, "failed to close reservation log: {}", err);
            }
            self.close_watches(resource, &watchers, now);
            Ok((lease, watchers))
        })?;

        let forced = &previous.holder != requester;
        let message = if forced {
            tracing::info!(
                resource = %resource,
                holder = %previous.holder,
                by = %requester,
                "resource force-released"
            );
            format!(
                "{} force-released \"{}\" (held by {}).",
                requester, resource, previous.holder
            )
        } else {
            tracing::info!(resource = %resource, holder = %requester, "resource released");
            format!("{} released \"{}\".", requester, resource)
        };
        let notified = self.dispatch(resource, &watchers, &message);

        Ok(ReleaseOutcome {
            resource: resource.clone(),
            previous_holder: previous.holder,
            forced,
            notified,
        })
    }

    /// Current lease state. Snapshot read; no resource lock.
    pub fn status(&self, resource: &ResourceId) -> Result<LeaseStatus, CoordinatorError> {
        let now = self.clock.now();
        self.require_known(resource)?;
        Ok(self.load(resource)?.status(now))
    }

    /// Registers or extends a watch. Returns the effective expiry, which is
    /// never earlier than an existing watch by the same identity.
    pub fn watch(
        &self,
        resource: &ResourceId,
        watcher: &UserId,
        minutes: i64,
    ) -> Result<DateTime<Utc>, CoordinatorError> {
        let now = self.clock.now();
        self.require_known(resource)?;
        if minutes <= 0 {
            return Err(CoordinatorError::InvalidDuration { minutes });
        }
        let requested = expiry(now, minutes)?;

        let effective = with_resource_lock(&self.locks, resource, || {
            let mut record = self.load(resource)?;
            let effective = record.watch(watcher.clone(), requested, now);
            self.store.put(&record)?;

            if let Err(err) = self.audit.open_watch(resource, watcher, now, effective) {
                tracing::warn!(resource = %resource, "failed to record watch: {}", err);
            }
            Ok::<_, CoordinatorError>(effective)
        })?;

        tracing::debug!(
            resource = %resource,
            watcher = %watcher,
            until = %effective,
            "watch registered"
        );
        Ok(effective)
    }

    /// Stops watching. Returns whether the caller had an active watch.
    pub fn unwatch(
        &self,
        resource: &ResourceId,
        watcher: &UserId,
    ) -> Result<bool, CoordinatorError> {
        let now = self.clock.now();
        self.require_known(resource)?;

        let was_watching = with_resource_lock(&self.locks, resource, || {
            let mut record = self.load(resource)?;
            let pruned = record.prune_expired_watchers(now);
            let was_watching = record.unwatch(watcher);
            if pruned > 0 || was_watching {
                self.store.put(&record)?;
            }

            if was_watching {
                if let Err(err) = self.audit.close_watch(resource, watcher, now) {
                    tracing::warn!(resource = %resource, "failed to close watch log: {}", err);
                }
            }
            Ok::<_, CoordinatorError>(was_watching)
        })?;

        tracing::debug!(resource = %resource, watcher = %watcher, was_watching, "unwatch");
        Ok(was_watching)
    }

    // -----------------------------------------------------------------------
    // Resource lifecycle
    // -----------------------------------------------------------------------

    /// Creates a free, unwatched resource. Checks the store directly, not the
    /// cache, then patches the cache write-through.
    pub fn create_resource(&self, resource: &ResourceId) -> Result<LeaseRecord, CoordinatorError> {
        let record = with_resource_lock(&self.locks, resource, || {
            if self.store.get(resource)?.is_some() {
                self.cache.add(resource);
                return Err(CoordinatorError::AlreadyExists(resource.clone()));
            }
            let record =
                LeaseRecord::with_max_lease(resource.clone(), self.config.default_max_lease_minutes);
            self.store.put(&record)?;
            self.cache.add(resource);
            Ok(record)
        })?;

        tracing::info!(resource = %resource, "resource created");
        Ok(record)
    }

    /// Deletes a resource and returns its final record.
    pub fn delete_resource(&self, resource: &ResourceId) -> Result<LeaseRecord, CoordinatorError> {
        let record = with_resource_lock(&self.locks, resource, || {
            let record = match self.store.get(resource)? {
                Some(record) => record,
                None => {
                    self.cache.remove(resource);
                    return Err(CoordinatorError::NotFound(resource.clone()));
                }
            };
            self.store.delete(resource)?;
            self.cache.remove(resource);
            Ok(record)
        })?;

        tracing::info!(resource = %resource, "resource deleted");
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Lists resources matching `filter` whose name starts with `prefix`.
    pub fn list_resources(
        &self,
        filter: ResourceFilter,
        prefix: Option<&str>,
    ) -> Result<Vec<ResourceView>, CoordinatorError> {
        let now = self.clock.now();
        let views = self
            .store
            .list_all()?
            .iter()
            .filter(|record| prefix.map_or(true, |p| record.name().as_str().starts_with(p)))
            .map(|record| ResourceView::of(record, now))
            .filter(|view| filter.admits(&view.status))
            .collect();
        Ok(views)
    }

    /// Status plus active watchers for one resource.
    pub fn describe(&self, resource: &ResourceId) -> Result<ResourceView, CoordinatorError> {
        let now = self.clock.now();
        self.require_known(resource)?;
        Ok(ResourceView::of(&self.load(resource)?, now))
    }

    /// Reservation history, most recent first.
    pub fn reservation_log(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, CoordinatorError> {
        Ok(self.audit.query(AuditKind::Reservation, query)?)
    }

    /// Watch history, most recent first.
    pub fn watch_log(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, CoordinatorError> {
        Ok(self.audit.query(AuditKind::Watch, query)?)
    }

    /// Rebuilds the existence cache now. Returns the number of resources.
    pub fn refresh_cache(&self) -> Result<usize, CoordinatorError> {
        Ok(self.cache.refresh()?)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn require_known(&self, resource: &ResourceId) -> Result<(), CoordinatorError> {
        if self.cache.contains(resource) {
            Ok(())
        } else {
            Err(CoordinatorError::NotFound(resource.clone()))
        }
    }

    /// Loads from the store. A cache hit for a resource the store no longer
    /// has is still `NotFound`.
    fn load(&self, resource: &ResourceId) -> Result<LeaseRecord, CoordinatorError> {
        self.store
            .get(resource)?
            .ok_or_else(|| CoordinatorError::NotFound(resource.clone()))
    }

    /// Ends the watch-log entries of watchers cleared from the record.
    fn close_watches(&self, resource: &ResourceId, watchers: &[WatchEntry], now: DateTime<Utc>) {
        for entry in watchers {
            if let Err(err) = self.audit.close_watch(resource, &entry.watcher, now) {
                tracing::warn!(
                    resource = %resource,
                    watcher = %entry.watcher,
                    "failed to close watch log: {}",
                    err
                );
            }
        }
    }

    /// Sends `message` to each watcher, one thread per watcher when there is
    /// more than one, so a slow delivery does not delay the others. Failures
    /// and panics are logged and skipped.
    fn dispatch(&self, resource: &ResourceId, watchers: &[WatchEntry], message: &str) -> usize {
        let notifier = &*self.notifier;
        match watchers {
            [] => {}
            [only] => deliver(notifier, resource, only, message),
            many => std::thread::scope(|scope| {
                let handles: Vec<_> = many
                    .iter()
                    .map(|entry| scope.spawn(move || deliver(notifier, resource, entry, message)))
                    .collect();
                for handle in handles {
                    if handle.join().is_err() {
                        tracing::warn!(resource = %resource, "notification thread panicked");
                    }
                }
            }),
        }
        watchers.len()
    }
}

fn deliver(
    notifier: &dyn NotificationDispatcher,
    resource: &ResourceId,
    entry: &WatchEntry,
    message: &str,
) {
    if let Err(err) = notifier.notify(&entry.watcher, message) {
        tracing::warn!(
            resource = %resource,
            watcher = %entry.watcher,
            "notification failed: {}",
            err
        );
    }
}

/// `now + minutes`, or `InvalidDuration` if that is not representable.
fn expiry(now: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>, CoordinatorError> {
    chrono::Duration::try_minutes(minutes)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or(CoordinatorError::InvalidDuration { minutes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use envlease_core::ManualClock;
    use envlease_storage::InMemoryStore;

    use crate::notify::RecordingNotifier;

    struct Fixture {
        coordinator: ReservationCoordinator,
        clock: Arc<ManualClock>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 7, 15, 9, 0, 0).unwrap(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = ReservationCoordinator::from_backend(
            Arc::new(InMemoryStore::new()),
            notifier.clone(),
            clock.clone(),
            CoordinatorConfig::default(),
        )
        .unwrap();
        Fixture {
            coordinator,
            clock,
            notifier,
        }
    }

    fn rid(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn test_reserve_then_conflict_reports_winner() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();

        let granted = f.coordinator.reserve(&env, &uid("alice"), 60).unwrap();
        assert_eq!(granted.until, f.clock.now() + Duration::minutes(60));

        match f.coordinator.reserve(&env, &uid("bob"), 30) {
            Err(CoordinatorError::AlreadyReserved { holder, until, .. }) => {
                assert_eq!(holder, uid("alice"));
                assert_eq!(until, granted.until);
            }
            other => panic!("expected AlreadyReserved, got {:?}", other),
        }
    }

    #[test]
    fn test_reserve_validation_order() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();

        assert!(matches!(
            f.coordinator.reserve(&rid("missing-env"), &uid("alice"), 10),
            Err(CoordinatorError::NotFound(_))
        ));
        assert!(matches!(
            f.coordinator.reserve(&env, &uid("alice"), 0),
            Err(CoordinatorError::InvalidDuration { minutes: 0 })
        ));
        assert!(matches!(
            f.coordinator.reserve(&env, &uid("alice"), 1441),
            Err(CoordinatorError::DurationExceedsPolicy { max: 1440, .. })
        ));
        assert!(f.coordinator.reserve(&env, &uid("alice"), 1440).is_ok());
    }

    #[test]
    fn test_expired_lease_can_be_reserved_again() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();
        f.coordinator.reserve(&env, &uid("alice"), 10).unwrap();

        f.clock.advance(Duration::minutes(10));
        assert_eq!(f.coordinator.status(&env).unwrap(), LeaseStatus::Free);
        let granted = f.coordinator.reserve(&env, &uid("bob"), 5).unwrap();
        assert_eq!(granted.holder, uid("bob"));
    }

    #[test]
    fn test_release_by_non_holder_requires_force() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();
        f.coordinator.reserve(&env, &uid("alice"), 60).unwrap();

        assert!(matches!(
            f.coordinator.release(&env, &uid("bob"), false),
            Err(CoordinatorError::NotHolder { .. })
        ));
        let outcome = f.coordinator.release(&env, &uid("admin"), true).unwrap();
        assert!(outcome.forced);
        assert_eq!(outcome.previous_holder, uid("alice"));
        assert!(matches!(
            f.coordinator.release(&env, &uid("alice"), false),
            Err(CoordinatorError::NotReserved(_))
        ));
    }

    #[test]
    fn test_release_notifies_each_watcher_once() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();
        f.coordinator.reserve(&env, &uid("alice"), 60).unwrap();
        f.coordinator.watch(&env, &uid("bob"), 120).unwrap();
        f.coordinator.watch(&env, &uid("bob"), 30).unwrap();

        let outcome = f.coordinator.release(&env, &uid("alice"), false).unwrap();
        assert_eq!(outcome.notified, 1);
        assert_eq!(
            f.notifier.messages_for(&uid("bob")),
            vec!["alice released \"env-a\".".to_string()]
        );
        assert!(f.coordinator.describe(&env).unwrap().watchers.is_empty());
    }

    #[test]
    fn test_watch_keeps_later_expiry() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();
        let now = f.clock.now();

        let first = f.coordinator.watch(&env, &uid("bob"), 120).unwrap();
        let second = f.coordinator.watch(&env, &uid("bob"), 30).unwrap();
        assert_eq!(first, now + Duration::minutes(120));
        assert_eq!(second, first);
    }

    #[test]
    fn test_unwatch_reports_whether_watching() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();
        f.coordinator.watch(&env, &uid("bob"), 5).unwrap();

        assert!(f.coordinator.unwatch(&env, &uid("bob")).unwrap());
        assert!(!f.coordinator.unwatch(&env, &uid("bob")).unwrap());

        // An expired watch no longer counts.
        f.coordinator.watch(&env, &uid("carol"), 1).unwrap();
        f.clock.advance(Duration::minutes(2));
        assert!(!f.coordinator.unwatch(&env, &uid("carol")).unwrap());
    }

    #[test]
    fn test_create_and_delete_lifecycle() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();
        assert!(matches!(
            f.coordinator.create_resource(&env),
            Err(CoordinatorError::AlreadyExists(_))
        ));
        assert!(f.coordinator.cache().contains(&env));
        f.coordinator.delete_resource(&env).unwrap();
        assert!(!f.coordinator.cache().contains(&env));
        assert!(matches!(
            f.coordinator.delete_resource(&env),
            Err(CoordinatorError::NotFound(_))
        ));
        assert!(matches!(
            f.coordinator.status(&env),
            Err(CoordinatorError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_filters_and_prefix() {
        let f = fixture();
        for name in ["prod:qa1", "prod:qa2", "dev:qa1"] {
            f.coordinator.create_resource(&rid(name)).unwrap();
        }
        f.coordinator.reserve(&rid("prod:qa1"), &uid("alice"), 30).unwrap();

        let names = |views: Vec<ResourceView>| -> Vec<String> {
            views.into_iter().map(|v| v.name.to_string()).collect()
        };
        assert_eq!(
            names(f.coordinator.list_resources(ResourceFilter::All, Some("prod:")).unwrap()),
            vec!["prod:qa1", "prod:qa2"]
        );
        assert_eq!(
            names(f.coordinator.list_resources(ResourceFilter::Reserved, None).unwrap()),
            vec!["prod:qa1"]
        );
        assert_eq!(
            names(f.coordinator.list_resources(ResourceFilter::Available, None).unwrap()),
            vec!["dev:qa1", "prod:qa2"]
        );
    }

    #[test]
    fn test_filter_parses() {
        assert_eq!("Reserved".parse::<ResourceFilter>().unwrap(), ResourceFilter::Reserved);
        assert_eq!("free".parse::<ResourceFilter>().unwrap(), ResourceFilter::Available);
        assert!("busy".parse::<ResourceFilter>().is_err());
    }

    #[test]
    fn test_huge_watch_duration_is_invalid() {
        let f = fixture();
        let env = rid("env-a");
        f.coordinator.create_resource(&env).unwrap();
        assert!(matches!(
            f.coordinator.watch(&env, &uid("bob"), i64::MAX),
            Err(CoordinatorError::InvalidDuration { .. })
        ));
    }
}
