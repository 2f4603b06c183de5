//! Core domain model, selection policy and the assignment lifecycle.

pub mod audit;
pub mod catalog;
pub mod collaborators;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod selector;
pub mod store;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use catalog::{CategoryCatalog, TaskCategory, HOUSE_VISIT, MOVE_OUT, PROPERTY_ONBOARDING};
pub use collaborators::{
    Notification, NotificationCategory, Notifier, RequesterCheck, ScheduleOracle,
};
pub use directory::{Scout, ScoutDirectory, Wallet, WalletCredit};
pub use error::{AppResult, DispatchError};
pub use lifecycle::{DispatchLimits, Dispatcher, RatingSummary};
pub use model::{
    toggle_tags, AssignmentRequest, Decision, RequestId, RequestStatus, ScoutId, Task, TaskId,
    TaskLinkage, TaskStatus,
};
pub use selector::{RatingSelector, ScoutSelector, SelectionContext};
pub use store::{AssignedSchedule, TaskEntry, TaskStore};
