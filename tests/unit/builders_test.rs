//! Tests for builders

use scout_dispatch::builders::{build_dispatcher, default_notifier};
use scout_dispatch::config::{DispatchConfig, NotifierBackendConfig};
use scout_dispatch::core::{
    Decision, DispatchError, Notifier, TaskLinkage, MOVE_OUT, PROPERTY_ONBOARDING,
};
use scout_dispatch::infra::{AvailabilityBook, FileNotifier, RequesterRegistry};

#[test]
fn test_build_dispatcher_from_defaults() {
    let cfg = DispatchConfig::default();
    let d = build_dispatcher(
        &cfg,
        default_notifier,
        Box::new(RequesterRegistry::new()),
        Box::new(AvailabilityBook::new()),
    )
    .unwrap();

    assert_eq!(d.catalog().len(), 3);
    assert_eq!(d.limits().max_offers_per_task, 5);
    let category = d.catalog().get(PROPERTY_ONBOARDING).unwrap();
    assert!(!category.sub_tasks.is_empty());
}

#[test]
fn test_build_dispatcher_rejects_invalid_config() {
    let cfg = DispatchConfig {
        max_offers_per_task: 0,
        ..DispatchConfig::default()
    };
    let result = build_dispatcher(
        &cfg,
        default_notifier,
        Box::new(RequesterRegistry::new()),
        Box::new(AvailabilityBook::new()),
    );
    assert!(matches!(result, Err(DispatchError::Backend(msg)) if msg.contains("config invalid")));
}

#[test]
fn test_file_notifier_survives_reopen() {
    let dir = std::env::temp_dir().join(format!("scout-dispatch-{}", uuid::Uuid::new_v4()));
    let cfg = DispatchConfig {
        notifications: NotifierBackendConfig::File { path: dir.clone() },
        ..DispatchConfig::default()
    };
    let d = build_dispatcher(
        &cfg,
        default_notifier,
        Box::new(RequesterRegistry::new()),
        Box::new(AvailabilityBook::new()),
    )
    .unwrap();
    let scout = d.scouts().register("Meera", "7000000002").unwrap();
    d.scouts().set_active(scout, true).unwrap();

    let task = d
        .create_task(
            MOVE_OUT,
            TaskLinkage::MoveOut {
                house_id: 1,
                booking_id: 2,
                move_out_request_id: 3,
            },
            chrono::Utc::now(),
        )
        .unwrap();
    let request = d.assign_new(task).unwrap();
    d.respond(request.id, Decision::Accepted).unwrap();
    d.cancel(task, "tenant extended stay").unwrap();

    let mut reopened = FileNotifier::new(&dir).unwrap();
    let listed = reopened.list(scout, 10).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].payload["reason"], "tenant extended stay");

    let _ = std::fs::remove_dir_all(dir);
}
