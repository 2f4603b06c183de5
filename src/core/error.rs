//! Error types for dispatch operations.

use thiserror::Error;

use super::model::{RequestId, TaskId, TaskStatus};

/// Errors produced by the assignment lifecycle and its collaborators.
///
/// None of these are fatal to the process; each is the outcome of one operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// Selection found nobody to offer the task to.
    #[error("no eligible scout found")]
    NoEligibleScout,
    /// The request was already resolved or its task moved on.
    #[error("assignment request {0} is no longer awaiting a response")]
    StaleRequest(RequestId),
    /// The task's current status does not allow the operation.
    #[error("task {task} cannot be {action} while {status}")]
    InvalidTransition {
        /// Task the operation targeted.
        task: TaskId,
        /// Operation attempted.
        action: &'static str,
        /// Status the task was found in.
        status: TaskStatus,
    },
    /// An offer for this task is still awaiting a response.
    #[error("task {0} already has an awaited assignment request")]
    RequestPending(TaskId),
    /// Rating must lie between 1 and 5.
    #[error("rating {0} must lie between 1 and 5")]
    RatingOutOfRange(u8),
    /// The task was rated before.
    #[error("task {0} has already been rated")]
    AlreadyRated(TaskId),
    /// The submitter is not the task's requester.
    #[error("`{0}` is not allowed to rate this task")]
    UnauthorizedRater(String),
    /// Re-offering is disabled for this task.
    #[error("task {0} must not be passed to another scout")]
    ReofferNotAllowed(TaskId),
    /// The task was offered the maximum number of times.
    #[error("task {task} reached the limit of {limit} offers")]
    OfferLimitReached {
        /// Task the offer targeted.
        task: TaskId,
        /// Configured limit.
        limit: usize,
    },
    /// A scout with this phone number is already registered.
    #[error("scout with phone number {0} already exists")]
    DuplicateScout(String),
    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// An external collaborator failed.
    #[error("collaborator failure: {0}")]
    Collaborator(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
