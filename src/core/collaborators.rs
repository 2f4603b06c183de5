//! Traits for the external collaborators the lifecycle consults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{ScoutId, Task};
use super::DispatchError;

/// Kind of notification shown to a scout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// A house visit the scout was assigned to was cancelled.
    HouseVisitCancelled,
    /// Any other assigned task was cancelled.
    TaskCancelled,
}

/// A notification addressed to one scout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: Uuid,
    /// Recipient.
    pub scout_id: ScoutId,
    /// Kind of notification.
    pub category: NotificationCategory,
    /// Structured description of the event.
    pub payload: serde_json::Value,
    /// Whether the scout has listed it.
    pub seen: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Abstraction for notification backends.
pub trait Notifier: Send {
    /// Record a notification for a scout.
    ///
    /// # Errors
    ///
    /// Backend failures are reported as `DispatchError::Backend`.
    fn notify(
        &mut self,
        scout: ScoutId,
        category: NotificationCategory,
        payload: serde_json::Value,
    ) -> Result<Notification, DispatchError>;

    /// Newest notifications first, at most `limit`; marks all of the scout's notifications seen.
    ///
    /// # Errors
    ///
    /// Backend failures are reported as `DispatchError::Backend`.
    fn list(&mut self, scout: ScoutId, limit: usize) -> Result<Vec<Notification>, DispatchError>;
}

/// Scheduling-conflict check used during selection.
pub trait ScheduleOracle: Send + Sync {
    /// True when the scout cannot take work at `at`.
    fn has_conflict(&self, scout: ScoutId, at: DateTime<Utc>) -> bool;
}

/// Verifies who may rate a task.
pub trait RequesterCheck: Send + Sync {
    /// True when `identity` requested the task.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Collaborator` when the requester record cannot be resolved.
    fn is_requester_for(&self, task: &Task, identity: &str) -> Result<bool, DispatchError>;
}
