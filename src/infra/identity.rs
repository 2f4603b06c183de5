//! Requester records used to authorize ratings.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::core::{DispatchError, RequesterCheck, Task, TaskLinkage};

#[derive(Debug, Clone)]
struct VisitRecord {
    customer: String,
    visited: bool,
}

/// Who requested each external record a task can link to.
///
/// House visits may only be rated once the visit took place.
#[derive(Debug, Default)]
pub struct RequesterRegistry {
    visits: RwLock<HashMap<u64, VisitRecord>>,
    bookings: RwLock<HashMap<u64, String>>,
    onboardings: RwLock<HashMap<u64, String>>,
}

impl RequesterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the customer who booked a house visit.
    pub fn register_visit(&self, visit_id: u64, customer: impl Into<String>) {
        self.visits.write().insert(
            visit_id,
            VisitRecord {
                customer: customer.into(),
                visited: false,
            },
        );
    }

    /// Mark a house visit as having taken place.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown visits.
    pub fn mark_visited(&self, visit_id: u64) -> Result<(), DispatchError> {
        self.visits
            .write()
            .get_mut(&visit_id)
            .map(|v| v.visited = true)
            .ok_or_else(|| DispatchError::NotFound(format!("house visit {visit_id}")))
    }

    /// Record the tenant behind a booking.
    pub fn register_booking(&self, booking_id: u64, tenant: impl Into<String>) {
        self.bookings.write().insert(booking_id, tenant.into());
    }

    /// Record the owner who submitted onboarding details.
    pub fn register_onboarding(&self, details_id: u64, owner: impl Into<String>) {
        self.onboardings.write().insert(details_id, owner.into());
    }
}

impl RequesterCheck for RequesterRegistry {
    fn is_requester_for(&self, task: &Task, identity: &str) -> Result<bool, DispatchError> {
        match &task.linkage {
            TaskLinkage::HouseVisit { visit_id, .. } => {
                let visits = self.visits.read();
                let visit = visits.get(visit_id).ok_or_else(|| {
                    DispatchError::Collaborator(format!("house visit {visit_id} not found"))
                })?;
                if !visit.visited {
                    return Err(DispatchError::Collaborator(format!(
                        "house visit {visit_id} has not taken place"
                    )));
                }
                Ok(visit.customer == identity)
            }
            TaskLinkage::MoveOut { booking_id, .. } => self
                .bookings
                .read()
                .get(booking_id)
                .map(|tenant| tenant == identity)
                .ok_or_else(|| DispatchError::Collaborator(format!("booking {booking_id} not found"))),
            TaskLinkage::PropertyOnboarding {
                onboarding_details_id,
            } => self
                .onboardings
                .read()
                .get(onboarding_details_id)
                .map(|owner| owner == identity)
                .ok_or_else(|| {
                    DispatchError::Collaborator(format!(
                        "onboarding details {onboarding_details_id} not found"
                    ))
                }),
        }
    }
}
