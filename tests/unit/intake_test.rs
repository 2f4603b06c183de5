//! Tests for trigger intake

use chrono::{TimeZone, Utc};

use scout_dispatch::builders::{build_dispatcher, default_notifier};
use scout_dispatch::config::{CategoryConfig, DispatchConfig};
use scout_dispatch::core::{Dispatcher, RequestStatus, ScoutId, TaskStatus, HOUSE_VISIT};
use scout_dispatch::infra::{AvailabilityBook, RequesterRegistry};
use scout_dispatch::runtime::{handle_trigger, TriggerEvent, TriggerOutcome};

fn dispatcher(cfg: &DispatchConfig) -> Dispatcher {
    build_dispatcher(
        cfg,
        default_notifier,
        Box::new(RequesterRegistry::new()),
        Box::new(AvailabilityBook::new()),
    )
    .unwrap()
}

fn with_scout(d: &Dispatcher) -> ScoutId {
    let id = d.scouts().register("Ravi", "7000000001").unwrap();
    d.scouts().set_active(id, true).unwrap();
    id
}

fn visit_event(visit_id: u64) -> TriggerEvent {
    TriggerEvent::HouseVisit {
        house_id: 10,
        visit_id,
        scheduled_at: Utc.with_ymd_and_hms(2026, 11, 4, 16, 0, 0).unwrap(),
    }
}

#[test]
fn test_house_visit_trigger_offers_task() {
    let d = dispatcher(&DispatchConfig::default());
    let scout = with_scout(&d);

    let TriggerOutcome::Done { task_id } = handle_trigger(&d, visit_event(1)) else {
        panic!("expected the task to be offered");
    };
    let requests = d.requests(task_id).unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].scout_id, scout);
    assert!(requests[0].pass_to_another_scout);
    assert_eq!(d.task(task_id).unwrap().category, HOUSE_VISIT);
}

#[test]
fn test_trigger_without_scouts_reports_no_scout() {
    let d = dispatcher(&DispatchConfig::default());

    let outcome = handle_trigger(&d, visit_event(1));
    let TriggerOutcome::NoScoutFound { task_id } = outcome else {
        panic!("expected NoScoutFound, got {outcome:?}");
    };
    assert_eq!(d.task(task_id).unwrap().status, TaskStatus::Unassigned);
}

#[test]
fn test_onboarding_with_manual_scout_is_not_passed_on() {
    let d = dispatcher(&DispatchConfig::default());
    let scout = with_scout(&d);
    let event = TriggerEvent::PropertyOnboarding {
        onboarding_details_id: 3,
        scheduled_at: Utc.with_ymd_and_hms(2026, 11, 5, 9, 0, 0).unwrap(),
        manually_chosen_scout_id: Some(scout),
    };

    let TriggerOutcome::Done { task_id } = handle_trigger(&d, event) else {
        panic!("expected the task to be offered");
    };
    let request = d.awaited_request_for(task_id, scout).unwrap().unwrap();
    assert!(!request.pass_to_another_scout);

    let unknown = TriggerEvent::PropertyOnboarding {
        onboarding_details_id: 4,
        scheduled_at: Utc.with_ymd_and_hms(2026, 11, 5, 12, 0, 0).unwrap(),
        manually_chosen_scout_id: Some(999),
    };
    assert!(matches!(
        handle_trigger(&d, unknown),
        TriggerOutcome::NoScoutFound { .. }
    ));
}

#[test]
fn test_visit_cancellation_trigger() {
    let d = dispatcher(&DispatchConfig::default());
    with_scout(&d);
    let TriggerOutcome::Done { task_id } = handle_trigger(&d, visit_event(8)) else {
        panic!("expected the task to be offered");
    };

    let cancel = TriggerEvent::HouseVisitCancelled {
        house_id: 10,
        visit_id: 8,
    };
    assert_eq!(handle_trigger(&d, cancel), TriggerOutcome::Done { task_id });
    assert_eq!(d.task(task_id).unwrap().status, TaskStatus::Cancelled);
    assert_eq!(
        d.requests(task_id).unwrap()[0].status,
        RequestStatus::Rejected
    );

    let missing = TriggerEvent::HouseVisitCancelled {
        house_id: 10,
        visit_id: 9,
    };
    assert_eq!(
        handle_trigger(&d, missing),
        TriggerOutcome::Failed("no such task exists".into())
    );
}

#[test]
fn test_trigger_for_unconfigured_category_fails() {
    let cfg = DispatchConfig {
        categories: vec![CategoryConfig {
            name: HOUSE_VISIT.to_string(),
            earning: 100.0,
            sub_tasks: Vec::new(),
        }],
        ..DispatchConfig::default()
    };
    let d = dispatcher(&cfg);
    let event = TriggerEvent::MoveOut {
        house_id: 1,
        booking_id: 2,
        move_out_request_id: 3,
        scheduled_at: Utc.with_ymd_and_hms(2026, 11, 6, 10, 0, 0).unwrap(),
    };

    assert!(matches!(handle_trigger(&d, event), TriggerOutcome::Failed(_)));
}

#[test]
fn test_trigger_wire_format() {
    let raw = r#"{
        "task_type": "house_visit",
        "data": { "house_id": 10, "visit_id": 1, "scheduled_at": "2026-11-04T16:00:00Z" }
    }"#;
    let event: TriggerEvent = serde_json::from_str(raw).unwrap();
    assert_eq!(event, visit_event(1));

    let outcome = serde_json::to_value(TriggerOutcome::Done { task_id: 5 }).unwrap();
    assert_eq!(
        outcome,
        serde_json::json!({ "status": "done", "detail": { "task_id": 5 } })
    );
}
