//! Tests for requester checks

use chrono::Utc;

use scout_dispatch::core::{
    DispatchError, RequesterCheck, Task, TaskCategory, TaskLinkage, HOUSE_VISIT, MOVE_OUT,
};
use scout_dispatch::infra::RequesterRegistry;

fn task(category: &str, linkage: TaskLinkage) -> Task {
    let category = TaskCategory {
        name: category.to_string(),
        earning: 100.0,
        sub_tasks: Vec::new(),
    };
    Task::new(1, &category, linkage, Utc::now())
}

#[test]
fn test_house_visit_requires_completed_visit() {
    let registry = RequesterRegistry::new();
    registry.register_visit(5, "customer-9");
    let visit = task(
        HOUSE_VISIT,
        TaskLinkage::HouseVisit {
            house_id: 1,
            visit_id: 5,
        },
    );

    assert!(matches!(
        registry.is_requester_for(&visit, "customer-9"),
        Err(DispatchError::Collaborator(_))
    ));

    registry.mark_visited(5).unwrap();
    assert_eq!(registry.is_requester_for(&visit, "customer-9"), Ok(true));
    assert_eq!(registry.is_requester_for(&visit, "customer-1"), Ok(false));
}

#[test]
fn test_move_out_checks_tenant() {
    let registry = RequesterRegistry::new();
    registry.register_booking(30, "tenant-4");
    let move_out = task(
        MOVE_OUT,
        TaskLinkage::MoveOut {
            house_id: 1,
            booking_id: 30,
            move_out_request_id: 2,
        },
    );

    assert_eq!(registry.is_requester_for(&move_out, "tenant-4"), Ok(true));
    assert_eq!(registry.is_requester_for(&move_out, "tenant-5"), Ok(false));
}

#[test]
fn test_unknown_records_are_collaborator_failures() {
    let registry = RequesterRegistry::new();
    let onboarding = task(
        "Property Onboarding",
        TaskLinkage::PropertyOnboarding {
            onboarding_details_id: 77,
        },
    );
    assert!(matches!(
        registry.is_requester_for(&onboarding, "owner"),
        Err(DispatchError::Collaborator(_))
    ));
    assert!(matches!(
        registry.mark_visited(404),
        Err(DispatchError::NotFound(_))
    ));
}
