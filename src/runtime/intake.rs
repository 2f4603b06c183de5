//! Trigger intake: turns external events into tasks and offers.
//!
//! This is the boundary where errors stop. Every event produces a
//! `TriggerOutcome`; unexpected failures are logged and reported as
//! `Failed` instead of propagating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{
    DispatchError, Dispatcher, ScoutId, TaskId, TaskLinkage, HOUSE_VISIT, MOVE_OUT,
    PROPERTY_ONBOARDING,
};

/// External event driving the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task_type", content = "data", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// A customer scheduled a house visit.
    HouseVisit {
        /// House to visit.
        house_id: u64,
        /// Visit record.
        visit_id: u64,
        /// Visit time.
        scheduled_at: DateTime<Utc>,
    },
    /// A tenant requested to move out.
    MoveOut {
        /// House being vacated.
        house_id: u64,
        /// Tenant's booking.
        booking_id: u64,
        /// Move-out request record.
        move_out_request_id: u64,
        /// Requested move-out time.
        scheduled_at: DateTime<Utc>,
    },
    /// An owner submitted a property for onboarding.
    PropertyOnboarding {
        /// Stored onboarding details.
        onboarding_details_id: u64,
        /// Inspection time.
        scheduled_at: DateTime<Utc>,
        /// Scout picked by the submitter; a rejection is then not passed on.
        #[serde(default)]
        manually_chosen_scout_id: Option<ScoutId>,
    },
    /// A customer cancelled a house visit.
    HouseVisitCancelled {
        /// House of the visit.
        house_id: u64,
        /// Cancelled visit.
        visit_id: u64,
    },
}

/// Result reported back to the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// The event was applied.
    Done {
        /// Task created or cancelled.
        task_id: TaskId,
    },
    /// A task was created but nobody could be offered it.
    NoScoutFound {
        /// Task left unassigned.
        task_id: TaskId,
    },
    /// The event could not be applied.
    Failed(String),
}

/// Apply one trigger event.
pub fn handle_trigger(dispatcher: &Dispatcher, event: TriggerEvent) -> TriggerOutcome {
    tracing::debug!(?event, "handling trigger");
    match event {
        TriggerEvent::HouseVisit {
            house_id,
            visit_id,
            scheduled_at,
        } => create_and_offer(
            dispatcher,
            HOUSE_VISIT,
            TaskLinkage::HouseVisit { house_id, visit_id },
            scheduled_at,
            None,
        ),
        TriggerEvent::MoveOut {
            house_id,
            booking_id,
            move_out_request_id,
            scheduled_at,
        } => create_and_offer(
            dispatcher,
            MOVE_OUT,
            TaskLinkage::MoveOut {
                house_id,
                booking_id,
                move_out_request_id,
            },
            scheduled_at,
            None,
        ),
        TriggerEvent::PropertyOnboarding {
            onboarding_details_id,
            scheduled_at,
            manually_chosen_scout_id,
        } => create_and_offer(
            dispatcher,
            PROPERTY_ONBOARDING,
            TaskLinkage::PropertyOnboarding {
                onboarding_details_id,
            },
            scheduled_at,
            manually_chosen_scout_id,
        ),
        TriggerEvent::HouseVisitCancelled { house_id, visit_id } => {
            let Some(task) = dispatcher.find_house_visit_task(house_id, visit_id) else {
                tracing::warn!(house_id, visit_id, "cancelled visit has no task");
                return TriggerOutcome::Failed("no such task exists".into());
            };
            match dispatcher.cancel(task.id, "house visit cancelled") {
                Ok(_) => TriggerOutcome::Done { task_id: task.id },
                Err(e) => TriggerOutcome::Failed(e.to_string()),
            }
        }
    }
}

fn create_and_offer(
    dispatcher: &Dispatcher,
    category: &str,
    linkage: TaskLinkage,
    scheduled_at: DateTime<Utc>,
    manual_scout: Option<ScoutId>,
) -> TriggerOutcome {
    let task_id = match dispatcher.create_task(category, linkage, scheduled_at) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(category, error = %e, "failed to create task");
            return TriggerOutcome::Failed(e.to_string());
        }
    };

    let offered = match manual_scout {
        Some(scout) => dispatcher.offer(task_id, Some(scout), false),
        None => dispatcher.assign_new(task_id),
    };
    match offered {
        Ok(_) => TriggerOutcome::Done { task_id },
        Err(DispatchError::NoEligibleScout) => {
            tracing::warn!(task = task_id, "no scout found");
            TriggerOutcome::NoScoutFound { task_id }
        }
        Err(e) => {
            tracing::error!(task = task_id, error = %e, "error while offering task");
            TriggerOutcome::NoScoutFound { task_id }
        }
    }
}
