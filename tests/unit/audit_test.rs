//! Tests for audit sink

use scout_dispatch::core::{build_audit_event, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(1, Some(11), Some(3), "offer", Some("payload".to_string()));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].task_id, 1);
    assert_eq!(events[0].action, "offer");
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, None, None, "create", None));
    sink.record(build_audit_event(2, None, None, "create", None));
    sink.record(build_audit_event(3, None, None, "create", None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, 2); // First one popped
    assert_eq!(events[1].task_id, 3);
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(4, Some(8), Some(2), "rate", Some("5".to_string()));

    assert_eq!(event.task_id, 4);
    assert_eq!(event.request_id, Some(8));
    assert_eq!(event.scout_id, Some(2));
    assert_eq!(event.action, "rate");
    assert_eq!(event.payload, Some("5".to_string()));
    assert!(event.created_at.timestamp() > 0);
}

#[test]
fn test_audit_event_ids_are_unique() {
    let a = build_audit_event(1, None, None, "create", None);
    let b = build_audit_event(1, None, None, "create", None);
    assert_ne!(a.event_id, b.event_id);
}
