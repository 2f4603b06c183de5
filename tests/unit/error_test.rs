//! Tests for error types

use scout_dispatch::core::{DispatchError, TaskStatus};

#[test]
fn test_error_display() {
    let err = DispatchError::NoEligibleScout;
    assert_eq!(err.to_string(), "no eligible scout found");

    let err = DispatchError::StaleRequest(12);
    assert_eq!(
        err.to_string(),
        "assignment request 12 is no longer awaiting a response"
    );

    let err = DispatchError::RatingOutOfRange(6);
    assert_eq!(err.to_string(), "rating 6 must lie between 1 and 5");

    let err = DispatchError::AlreadyRated(4);
    assert_eq!(err.to_string(), "task 4 has already been rated");

    let err = DispatchError::NotFound("task 7".into());
    assert_eq!(err.to_string(), "task 7 not found");
}

#[test]
fn test_invalid_transition_display() {
    let err = DispatchError::InvalidTransition {
        task: 2,
        action: "cancelled",
        status: TaskStatus::Cancelled,
    };
    assert_eq!(err.to_string(), "task 2 cannot be cancelled while cancelled");
}

#[test]
fn test_error_equality() {
    assert_eq!(DispatchError::RequestPending(1), DispatchError::RequestPending(1));
    assert_ne!(DispatchError::RequestPending(1), DispatchError::ReofferNotAllowed(1));
}

#[test]
fn test_error_converts_into_anyhow() {
    let err: anyhow::Error = DispatchError::Backend("disk full".into()).into();
    assert_eq!(err.to_string(), "backend error: disk full");
    assert!(err.downcast_ref::<DispatchError>().is_some());
}
