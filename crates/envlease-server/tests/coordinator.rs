//! End-to-end coordinator scenarios, run against both storage backends.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use envlease_core::{
    AuditQuery, Clock, LeaseRecord, LeaseStatus, ManualClock, ResourceId, UserId,
};
use envlease_server::config::CoordinatorConfig;
use envlease_server::coordinator::ReservationCoordinator;
use envlease_server::error::CoordinatorError;
use envlease_server::notify::{NotificationDispatcher, NotifyError, RecordingNotifier};
use envlease_storage::{InMemoryStore, LeaseStore, SqliteStore};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
enum Backend {
    Memory,
    Sqlite,
}

const BACKENDS: [Backend; 2] = [Backend::Memory, Backend::Sqlite];

struct Harness {
    coordinator: ReservationCoordinator,
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 9, 0, 0).unwrap()
}

fn harness(backend: Backend) -> Harness {
    let clock = Arc::new(ManualClock::new(start()));
    let notifier = Arc::new(RecordingNotifier::new());
    let coordinator = match backend {
        Backend::Memory => ReservationCoordinator::from_backend(
            Arc::new(InMemoryStore::new()),
            notifier.clone(),
            clock.clone(),
            CoordinatorConfig::default(),
        ),
        Backend::Sqlite => ReservationCoordinator::from_backend(
            Arc::new(SqliteStore::in_memory().unwrap()),
            notifier.clone(),
            clock.clone(),
            CoordinatorConfig::default(),
        ),
    }
    .unwrap();
    Harness {
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

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn alice_reserves_bob_watches_and_is_told_on_release() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();

        let granted = h.coordinator.reserve(&env, &uid("alice"), 60).unwrap();
        assert_eq!(granted.until, start() + Duration::minutes(60), "{:?}", backend);

        match h.coordinator.reserve(&env, &uid("bob"), 30) {
            Err(CoordinatorError::AlreadyReserved { holder, until, .. }) => {
                assert_eq!(holder, uid("alice"));
                assert_eq!(until, granted.until);
            }
            other => panic!("{:?}: expected AlreadyReserved, got {:?}", backend, other),
        }

        h.coordinator.watch(&env, &uid("bob"), 120).unwrap();
        let released = h.coordinator.release(&env, &uid("alice"), false).unwrap();
        assert_eq!(released.notified, 1);
        assert_eq!(h.notifier.messages_for(&uid("bob")).len(), 1, "{:?}", backend);
        assert_eq!(h.coordinator.status(&env).unwrap(), LeaseStatus::Free);
    }
}

#[test]
fn rejected_reservations() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();

        assert!(matches!(
            h.coordinator.reserve(&rid("missing-env"), &uid("alice"), 10),
            Err(CoordinatorError::NotFound(_))
        ));
        assert!(matches!(
            h.coordinator.reserve(&env, &uid("alice"), 0),
            Err(CoordinatorError::InvalidDuration { .. })
        ));
        assert!(matches!(
            h.coordinator.reserve(&env, &uid("alice"), -5),
            Err(CoordinatorError::InvalidDuration { .. })
        ));
        match h.coordinator.reserve(&env, &uid("alice"), 1441) {
            Err(CoordinatorError::DurationExceedsPolicy { max, .. }) => assert_eq!(max, 1440),
            other => panic!("{:?}: expected DurationExceedsPolicy, got {:?}", backend, other),
        }
        // Nothing was reserved by the failed attempts.
        assert_eq!(h.coordinator.status(&env).unwrap(), LeaseStatus::Free);
    }
}

#[test]
fn lease_expires_lazily_at_its_boundary() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();
        h.coordinator.reserve(&env, &uid("alice"), 30).unwrap();

        h.clock.set(start() + Duration::minutes(30) - Duration::seconds(1));
        assert!(h.coordinator.status(&env).unwrap().is_held());

        h.clock.set(start() + Duration::minutes(30));
        assert_eq!(h.coordinator.status(&env).unwrap(), LeaseStatus::Free);

        // The holder of an expired lease can no longer release it.
        assert!(matches!(
            h.coordinator.release(&env, &uid("alice"), false),
            Err(CoordinatorError::NotReserved(_))
        ));
    }
}

#[test]
fn new_reservation_notifies_and_clears_prior_watchers() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();

        // Watchers registered while the resource was free.
        h.coordinator.watch(&env, &uid("bob"), 120).unwrap();
        h.coordinator.watch(&env, &uid("carol"), 120).unwrap();

        let granted = h.coordinator.reserve(&env, &uid("dave"), 60).unwrap();
        assert_eq!(granted.notified, 2);
        assert!(h.coordinator.describe(&env).unwrap().watchers.is_empty());

        // dave's release reaches nobody: the earlier watchers were cleared.
        let released = h.coordinator.release(&env, &uid("dave"), false).unwrap();
        assert_eq!(released.notified, 0);
        assert_eq!(h.notifier.messages_for(&uid("bob")).len(), 1);
        assert_eq!(h.notifier.messages_for(&uid("carol")).len(), 1);
    }
}

#[test]
fn release_then_immediate_reserve_does_not_renotify() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();
        h.coordinator.reserve(&env, &uid("xavier"), 60).unwrap();
        h.coordinator.watch(&env, &uid("bob"), 120).unwrap();

        h.coordinator.release(&env, &uid("xavier"), false).unwrap();
        h.coordinator.reserve(&env, &uid("yvonne"), 60).unwrap();

        let messages = h.notifier.messages_for(&uid("bob"));
        assert_eq!(messages, vec!["xavier released \"env-a\".".to_string()]);
    }
}

#[test]
fn watchers_added_after_release_are_unaffected() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();
        h.coordinator.reserve(&env, &uid("alice"), 60).unwrap();
        h.coordinator.release(&env, &uid("alice"), false).unwrap();

        h.coordinator.watch(&env, &uid("bob"), 60).unwrap();
        assert!(h.notifier.sent().is_empty());
        assert_eq!(h.coordinator.describe(&env).unwrap().watchers.len(), 1);
    }
}

#[test]
fn expired_watchers_are_not_notified() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();
        h.coordinator.reserve(&env, &uid("alice"), 120).unwrap();
        h.coordinator.watch(&env, &uid("bob"), 10).unwrap();
        h.coordinator.watch(&env, &uid("carol"), 90).unwrap();

        h.clock.advance(Duration::minutes(30));
        let released = h.coordinator.release(&env, &uid("alice"), false).unwrap();
        assert_eq!(released.notified, 1);
        assert!(h.notifier.messages_for(&uid("bob")).is_empty());
        assert_eq!(h.notifier.messages_for(&uid("carol")).len(), 1);
    }
}

#[test]
fn force_release_closes_the_holders_audit_entry() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();
        h.coordinator.reserve(&env, &uid("alice"), 60).unwrap();

        h.clock.advance(Duration::minutes(15));
        let outcome = h.coordinator.release(&env, &uid("root"), true).unwrap();
        assert!(outcome.forced);

        let log = h
            .coordinator
            .reservation_log(&AuditQuery::for_resource(env.clone()))
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].subject, uid("alice"));
        assert_eq!(log[0].end, Some(start() + Duration::minutes(15)));
    }
}

#[test]
fn watch_history_extends_then_closes() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();

        h.coordinator.watch(&env, &uid("bob"), 30).unwrap();
        h.coordinator.watch(&env, &uid("bob"), 90).unwrap();
        h.clock.advance(Duration::minutes(5));
        assert!(h.coordinator.unwatch(&env, &uid("bob")).unwrap());

        let log = h
            .coordinator
            .watch_log(&AuditQuery::for_subject(uid("bob")))
            .unwrap();
        assert_eq!(log.len(), 1, "{:?}", backend);
        assert_eq!(log[0].end, Some(start() + Duration::minutes(5)));
    }
}

#[test]
fn release_ends_the_watch_history_of_cleared_watchers() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        let bob = uid("bob");
        h.coordinator.create_resource(&env).unwrap();
        h.coordinator.reserve(&env, &uid("alice"), 60).unwrap();
        h.coordinator.watch(&env, &bob, 120).unwrap();

        h.clock.set(start() + Duration::minutes(10));
        h.coordinator.release(&env, &uid("alice"), false).unwrap();

        h.clock.set(start() + Duration::minutes(20));
        assert!(!h.coordinator.unwatch(&env, &bob).unwrap(), "{:?}", backend);

        h.clock.set(start() + Duration::minutes(30));
        h.coordinator.watch(&env, &bob, 30).unwrap();

        let spans: Vec<_> = h
            .coordinator
            .watch_log(&AuditQuery::for_subject(bob.clone()))
            .unwrap()
            .into_iter()
            .map(|e| (e.start, e.end))
            .collect();
        assert_eq!(
            spans,
            vec![
                (start() + Duration::minutes(30), Some(start() + Duration::minutes(60))),
                (start(), Some(start() + Duration::minutes(10))),
            ],
            "{:?}",
            backend
        );
    }
}

#[test]
fn reserve_ends_the_watch_history_of_displaced_watchers() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();
        h.coordinator.watch(&env, &uid("bob"), 120).unwrap();
        h.coordinator.watch(&env, &uid("carol"), 5).unwrap();

        h.clock.set(start() + Duration::minutes(15));
        h.coordinator.reserve(&env, &uid("dave"), 60).unwrap();

        let log = h
            .coordinator
            .watch_log(&AuditQuery::for_resource(env.clone()))
            .unwrap();
        let end_of = |who: &str| {
            log.iter()
                .find(|e| e.subject == uid(who))
                .and_then(|e| e.end)
                .unwrap()
        };
        assert_eq!(end_of("bob"), start() + Duration::minutes(15), "{:?}", backend);
        // carol's watch had already lapsed; its planned end stands.
        assert_eq!(end_of("carol"), start() + Duration::minutes(5), "{:?}", backend);
    }
}

#[test]
fn rejected_watches() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();

        for minutes in [0, -30] {
            match h.coordinator.watch(&env, &uid("bob"), minutes) {
                Err(CoordinatorError::InvalidDuration { minutes: m }) => assert_eq!(m, minutes),
                other => panic!("{:?}: expected InvalidDuration, got {:?}", backend, other),
            }
        }
        assert!(matches!(
            h.coordinator.watch(&rid("missing-env"), &uid("bob"), 30),
            Err(CoordinatorError::NotFound(_))
        ));
        assert!(matches!(
            h.coordinator.unwatch(&rid("missing-env"), &uid("bob")),
            Err(CoordinatorError::NotFound(_))
        ));

        // Nothing was registered or logged by the failed attempts.
        assert!(h.coordinator.describe(&env).unwrap().watchers.is_empty());
        assert!(h
            .coordinator
            .watch_log(&AuditQuery::default())
            .unwrap()
            .is_empty());
    }
}

#[test]
fn reservation_log_is_most_recent_first() {
    for backend in BACKENDS {
        let h = harness(backend);
        let env = rid("env-a");
        h.coordinator.create_resource(&env).unwrap();

        for user in ["alice", "bob", "carol"] {
            h.coordinator.reserve(&env, &uid(user), 10).unwrap();
            h.clock.advance(Duration::minutes(1));
            h.coordinator.release(&env, &uid(user), false).unwrap();
        }

        let subjects: Vec<String> = h
            .coordinator
            .reservation_log(&AuditQuery::default())
            .unwrap()
            .into_iter()
            .map(|e| e.subject.to_string())
            .collect();
        assert_eq!(subjects, vec!["carol", "bob", "alice"]);
    }
}

#[test]
fn create_bypasses_stale_cache() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let coordinator = ReservationCoordinator::from_backend(
        store.clone(),
        Arc::new(RecordingNotifier::new()),
        clock,
        CoordinatorConfig::default(),
    )
    .unwrap();

    // Another process inserted the row; the cache has not seen it.
    store.put(&LeaseRecord::new(rid("env-b"))).unwrap();

    assert!(matches!(
        coordinator.create_resource(&rid("env-b")),
        Err(CoordinatorError::AlreadyExists(_))
    ));
    // The failed create healed the cache.
    assert!(coordinator.status(&rid("env-b")).is_ok());
}

struct FailingNotifier;

impl NotificationDispatcher for FailingNotifier {
    fn notify(&self, recipient: &UserId, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery {
            recipient: recipient.clone(),
            reason: "chat service down".to_string(),
        })
    }
}

#[test]
fn notification_failure_does_not_undo_release() {
    let clock = Arc::new(ManualClock::new(start()));
    let coordinator = ReservationCoordinator::from_backend(
        Arc::new(InMemoryStore::new()),
        Arc::new(FailingNotifier),
        clock.clone(),
        CoordinatorConfig::default(),
    )
    .unwrap();
    let env = rid("env-a");
    coordinator.create_resource(&env).unwrap();
    coordinator.reserve(&env, &uid("alice"), 60).unwrap();
    coordinator.watch(&env, &uid("bob"), 60).unwrap();

    assert!(coordinator.release(&env, &uid("alice"), false).is_ok());
    assert_eq!(coordinator.status(&env).unwrap(), LeaseStatus::Free);
    assert_eq!(coordinator.now(), clock.now());
}

#[test]
fn sqlite_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leases.db");
    let path = path.to_str().unwrap();
    let clock = Arc::new(ManualClock::new(start()));

    {
        let coordinator = ReservationCoordinator::from_backend(
            Arc::new(SqliteStore::new(path).unwrap()),
            Arc::new(RecordingNotifier::new()),
            clock.clone(),
            CoordinatorConfig::default(),
        )
        .unwrap();
        coordinator.create_resource(&rid("env-a")).unwrap();
        coordinator.reserve(&rid("env-a"), &uid("alice"), 45).unwrap();
        coordinator.watch(&rid("env-a"), &uid("bob"), 90).unwrap();
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let coordinator = ReservationCoordinator::from_backend(
        Arc::new(SqliteStore::new(path).unwrap()),
        notifier.clone(),
        clock,
        CoordinatorConfig::default(),
    )
    .unwrap();
    match coordinator.status(&rid("env-a")).unwrap() {
        LeaseStatus::Held { holder, until } => {
            assert_eq!(holder, uid("alice"));
            assert_eq!(until, start() + Duration::minutes(45));
        }
        LeaseStatus::Free => panic!("lease lost across restart"),
    }
    coordinator
        .release(&rid("env-a"), &uid("alice"), false)
        .unwrap();
    assert_eq!(notifier.messages_for(&uid("bob")).len(), 1);
}
