//! Tasks, assignment requests and their statuses.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{TaskCategory, HOUSE_VISIT, MOVE_OUT, PROPERTY_ONBOARDING};

/// Scout identifier.
pub type ScoutId = u64;
/// Task identifier.
pub type TaskId = u64;
/// Assignment request identifier.
pub type RequestId = u64;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a scout to accept.
    Unassigned,
    /// Held by exactly one scout.
    Assigned,
    /// Done.
    Complete,
    /// Withdrawn before completion.
    Cancelled,
}

impl TaskStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigned => "assigned",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for the scout's answer.
    Awaited,
    /// The scout took the task.
    Accepted,
    /// The scout declined, gave the task back, or the offer expired.
    Rejected,
}

/// A scout's answer to an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Take the task.
    Accepted,
    /// Decline the task.
    Rejected,
}

impl From<Decision> for RequestStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => Self::Accepted,
            Decision::Rejected => Self::Rejected,
        }
    }
}

/// External record a task was created for. Exactly one per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskLinkage {
    /// A customer visiting a house.
    HouseVisit {
        /// House being visited.
        house_id: u64,
        /// Visit record.
        visit_id: u64,
    },
    /// A tenant moving out of a booked house.
    MoveOut {
        /// House being vacated.
        house_id: u64,
        /// Tenant's booking.
        booking_id: u64,
        /// Move-out request record.
        move_out_request_id: u64,
    },
    /// A new property being listed.
    PropertyOnboarding {
        /// Onboarding details record.
        onboarding_details_id: u64,
    },
}

impl TaskLinkage {
    /// Name of the category this linkage belongs to.
    #[must_use]
    pub const fn category_name(&self) -> &'static str {
        match self {
            Self::HouseVisit { .. } => HOUSE_VISIT,
            Self::MoveOut { .. } => MOVE_OUT,
            Self::PropertyOnboarding { .. } => PROPERTY_ONBOARDING,
        }
    }
}

/// A unit of field work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Category name.
    pub category: String,
    /// Current status.
    pub status: TaskStatus,
    /// Assigned scout; set exactly when `status` is `Assigned`.
    pub scout: Option<ScoutId>,
    /// Scout that completed the task.
    pub completed_by: Option<ScoutId>,
    /// When the work is due.
    pub scheduled_at: DateTime<Utc>,
    /// External record the task was created for.
    pub linkage: TaskLinkage,
    /// Amount paid on completion, copied from the category.
    pub earning: f64,
    /// Sub-task names copied from the category templates.
    pub sub_tasks: Vec<String>,
    /// Scout's remark on completion.
    pub remark: Option<String>,
    /// Customer's rating, once given.
    pub rating: Option<u8>,
    /// Customer's remarks with the rating.
    pub remarks: Option<String>,
    /// Review tags currently attached to the task.
    pub review_tags: BTreeSet<String>,
    /// Guards against rating twice.
    pub rating_given: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create an unassigned task from its category.
    #[must_use]
    pub fn new(
        id: TaskId,
        category: &TaskCategory,
        linkage: TaskLinkage,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            category: category.name.clone(),
            status: TaskStatus::Unassigned,
            scout: None,
            completed_by: None,
            scheduled_at,
            linkage,
            earning: category.earning,
            sub_tasks: category.sub_tasks.clone(),
            remark: None,
            rating: None,
            remarks: None,
            review_tags: BTreeSet::new(),
            rating_given: false,
            created_at: Utc::now(),
        }
    }

    /// Scout a rating applies to: the one who completed the task.
    #[must_use]
    pub const fn scout_for_rating(&self) -> Option<ScoutId> {
        match self.status {
            TaskStatus::Complete => self.completed_by,
            _ => None,
        }
    }

    /// True when the scout reference agrees with the status.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.scout.is_some() == matches!(self.status, TaskStatus::Assigned)
    }
}

/// One offer of one task to one scout. Kept after resolution as an audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    /// Request identifier.
    pub id: RequestId,
    /// Offered task.
    pub task_id: TaskId,
    /// Scout the task was offered to.
    pub scout_id: ScoutId,
    /// Current status.
    pub status: RequestStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the first response.
    pub responded_at: Option<DateTime<Utc>>,
    /// Whether a rejection lets the task move on to another scout.
    pub pass_to_another_scout: bool,
}

/// Flip membership of every tag: present tags are removed, absent ones added.
pub fn toggle_tags<'a>(set: &mut BTreeSet<String>, tags: impl IntoIterator<Item = &'a String>) {
    for tag in tags {
        if !set.remove(tag) {
            set.insert(tag.clone());
        }
    }
}
