//! Assignment request lifecycle.
//!
//! `Dispatcher` owns the coupled state machines of tasks and their assignment
//! requests:
//!
//! ```text
//! Task:    Unassigned -> Assigned -> {Complete, Cancelled}
//!          Assigned -> Unassigned          (unassign)
//!          Unassigned -> Cancelled         (cancel)
//! Request: Awaited -> {Accepted, Rejected}
//! ```
//!
//! Every operation locks the target task's entry for its whole read-check-write
//! sequence. Selection state (candidates, open-task counts, busy times) is gathered
//! before that lock is taken, because gathering it visits other entries.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::audit::{build_audit_event, AuditSink};
use super::catalog::{CategoryCatalog, HOUSE_VISIT};
use super::collaborators::{
    Notification, NotificationCategory, Notifier, RequesterCheck, ScheduleOracle,
};
use super::directory::{Scout, ScoutDirectory};
use super::model::{
    toggle_tags, AssignmentRequest, Decision, RequestId, RequestStatus, ScoutId, Task, TaskId,
    TaskLinkage, TaskStatus,
};
use super::selector::{RatingSelector, ScoutSelector, SelectionContext};
use super::store::{AssignedSchedule, TaskEntry, TaskStore};
use super::DispatchError;

/// Limits applied by the lifecycle.
#[derive(Debug, Clone)]
pub struct DispatchLimits {
    /// Maximum number of requests ever created for one task.
    pub max_offers_per_task: usize,
    /// Two tasks of one scout conflict when scheduled closer than this.
    pub conflict_window: Duration,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_offers_per_task: 5,
            conflict_window: Duration::minutes(60),
        }
    }
}

/// Result of a successful rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Scout's aggregate rating after this one.
    pub rating: f64,
    /// Remarks recorded on the task.
    pub remarks: Option<String>,
}

#[derive(Serialize)]
struct CancelledTaskPayload<'a> {
    task: &'a Task,
    reason: &'a str,
}

/// Combined conflict check: declared availability plus already assigned work.
struct ConflictCheck<'a> {
    assigned: AssignedSchedule,
    availability: &'a dyn ScheduleOracle,
}

impl ScheduleOracle for ConflictCheck<'_> {
    fn has_conflict(&self, scout: ScoutId, at: DateTime<Utc>) -> bool {
        self.assigned.is_busy(scout, at) || self.availability.has_conflict(scout, at)
    }
}

/// Task assignment service: selection, offers, responses and task outcomes.
pub struct Dispatcher {
    catalog: CategoryCatalog,
    scouts: ScoutDirectory,
    store: TaskStore,
    selector: Box<dyn ScoutSelector>,
    schedule: Box<dyn ScheduleOracle>,
    requesters: Box<dyn RequesterCheck>,
    notifier: Mutex<Box<dyn Notifier>>,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
    limits: DispatchLimits,
}

impl Dispatcher {
    /// Create a dispatcher from its collaborators, using `RatingSelector`.
    #[must_use]
    pub fn new(
        catalog: CategoryCatalog,
        scouts: ScoutDirectory,
        notifier: Box<dyn Notifier>,
        requesters: Box<dyn RequesterCheck>,
        schedule: Box<dyn ScheduleOracle>,
        limits: DispatchLimits,
    ) -> Self {
        Self {
            catalog,
            scouts,
            store: TaskStore::new(),
            selector: Box::new(RatingSelector),
            schedule,
            requesters,
            notifier: Mutex::new(notifier),
            audit: None,
            limits,
        }
    }

    /// Replace the selection policy.
    #[must_use]
    pub fn with_selector(mut self, selector: Box<dyn ScoutSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// Scout directory.
    #[must_use]
    pub const fn scouts(&self) -> &ScoutDirectory {
        &self.scouts
    }

    /// Category catalog.
    #[must_use]
    pub const fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Configured limits.
    #[must_use]
    pub const fn limits(&self) -> &DispatchLimits {
        &self.limits
    }

    /// Create an unassigned task of the named category.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown categories.
    pub fn create_task(
        &self,
        category: &str,
        linkage: TaskLinkage,
        scheduled_at: DateTime<Utc>,
    ) -> Result<TaskId, DispatchError> {
        let category = self.catalog.get(category)?;
        let task = self.store.create(category, linkage, scheduled_at);
        tracing::info!(task = task.id, category = %task.category, "task created");
        self.record_audit(task.id, None, None, "create", None);
        Ok(task.id)
    }

    /// Snapshot of a task.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown tasks.
    pub fn task(&self, id: TaskId) -> Result<Task, DispatchError> {
        Ok(self.store.entry(id)?.lock().task.clone())
    }

    /// Every request made for a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown tasks.
    pub fn requests(&self, id: TaskId) -> Result<Vec<AssignmentRequest>, DispatchError> {
        Ok(self.store.entry(id)?.lock().requests.clone())
    }

    /// Snapshot of a single request.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown requests.
    pub fn request(&self, id: RequestId) -> Result<AssignmentRequest, DispatchError> {
        let task_id = self.store.task_for_request(id)?;
        let entry = self.store.entry(task_id)?;
        let entry = entry.lock();
        entry
            .request(id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("assignment request {id}")))
    }

    /// The scout's awaited request for a task, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown tasks.
    pub fn awaited_request_for(
        &self,
        task: TaskId,
        scout: ScoutId,
    ) -> Result<Option<AssignmentRequest>, DispatchError> {
        let entry = self.store.entry(task)?;
        let entry = entry.lock();
        Ok(entry.awaited().filter(|r| r.scout_id == scout).cloned())
    }

    /// A scout's assigned tasks ordered by schedule.
    #[must_use]
    pub fn assigned_tasks(&self, scout: ScoutId) -> Vec<Task> {
        self.store.assigned_to(scout)
    }

    /// House-visit task created for the given visit.
    #[must_use]
    pub fn find_house_visit_task(&self, house_id: u64, visit_id: u64) -> Option<Task> {
        let wanted = TaskLinkage::HouseVisit { house_id, visit_id };
        self.store
            .find(|t| t.category == HOUSE_VISIT && t.linkage == wanted)
    }

    /// A scout's notifications, newest first; marks them seen.
    ///
    /// # Errors
    ///
    /// Backend failures are reported as `DispatchError::Backend`.
    pub fn notifications(
        &self,
        scout: ScoutId,
        limit: usize,
    ) -> Result<Vec<Notification>, DispatchError> {
        self.notifier.lock().list(scout, limit)
    }

    /// Select a scout for an unassigned task, skipping `exclude` and anyone awaited.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown tasks.
    pub fn select(&self, task: TaskId, exclude: &[ScoutId]) -> Result<Option<Scout>, DispatchError> {
        let gathered = self.gather();
        let entry = self.store.entry(task)?;
        let entry = entry.lock();
        let mut excluded: HashSet<ScoutId> = exclude.iter().copied().collect();
        excluded.extend(entry.awaited().map(|r| r.scout_id));
        Ok(self.select_locked(&entry, &gathered, &excluded).cloned())
    }

    /// Offer a task to a scout.
    ///
    /// The task stays unassigned until the scout accepts.
    ///
    /// # Errors
    ///
    /// - `NoEligibleScout` when `scout` is `None` or unknown
    /// - `InvalidTransition` unless the task is unassigned
    /// - `RequestPending` when another offer is awaited
    /// - `OfferLimitReached` once `max_offers_per_task` requests exist
    pub fn offer(
        &self,
        task: TaskId,
        scout: Option<ScoutId>,
        pass_to_another_scout: bool,
    ) -> Result<AssignmentRequest, DispatchError> {
        let Some(scout) = scout.filter(|id| self.scouts.contains(*id)) else {
            tracing::warn!(task, ?scout, "no scout to offer task to");
            return Err(DispatchError::NoEligibleScout);
        };
        let entry = self.store.entry(task)?;
        let mut entry = entry.lock();
        self.offer_locked(&mut entry, scout, pass_to_another_scout)
    }

    /// Select a scout among active ones and offer the task to them.
    ///
    /// # Errors
    ///
    /// Returns `NoEligibleScout` when selection finds nobody, plus every error of [`Self::offer`].
    pub fn assign_new(&self, task: TaskId) -> Result<AssignmentRequest, DispatchError> {
        let gathered = self.gather();
        let entry = self.store.entry(task)?;
        let mut entry = entry.lock();
        let excluded: HashSet<ScoutId> = entry.awaited().map(|r| r.scout_id).into_iter().collect();
        let scout = self
            .select_locked(&entry, &gathered, &excluded)
            .map(|s| s.id)
            .ok_or(DispatchError::NoEligibleScout)?;
        self.offer_locked(&mut entry, scout, true)
    }

    /// Offer a task again after its latest request was rejected.
    ///
    /// Every scout that already received an offer for the task is skipped.
    ///
    /// # Errors
    ///
    /// - `ReofferNotAllowed` when the latest request disabled passing on
    /// - `OfferLimitReached` once `max_offers_per_task` requests exist
    /// - `NoEligibleScout` when nobody is left
    pub fn reoffer(&self, task: TaskId) -> Result<AssignmentRequest, DispatchError> {
        let gathered = self.gather();
        let entry = self.store.entry(task)?;
        let mut entry = entry.lock();
        if entry
            .requests
            .last()
            .is_some_and(|r| !r.pass_to_another_scout)
        {
            return Err(DispatchError::ReofferNotAllowed(task));
        }
        self.check_offerable(&entry)?;
        let excluded: HashSet<ScoutId> = entry.requests.iter().map(|r| r.scout_id).collect();
        let scout = self
            .select_locked(&entry, &gathered, &excluded)
            .map(|s| s.id)
            .ok_or(DispatchError::NoEligibleScout)?;
        tracing::info!(task, scout, attempt = entry.requests.len() + 1, "re-offering task");
        self.offer_locked(&mut entry, scout, true)
    }

    /// Record a scout's answer to an offer.
    ///
    /// # Errors
    ///
    /// Returns `StaleRequest` when the request is no longer awaited or its task
    /// is no longer unassigned.
    pub fn respond(
        &self,
        request: RequestId,
        decision: Decision,
    ) -> Result<AssignmentRequest, DispatchError> {
        let task_id = self.store.task_for_request(request)?;
        let entry = self.store.entry(task_id)?;
        let mut entry = entry.lock();
        let TaskEntry { task, requests } = &mut *entry;

        let req = requests
            .iter_mut()
            .find(|r| r.id == request)
            .ok_or_else(|| DispatchError::NotFound(format!("assignment request {request}")))?;
        if req.status != RequestStatus::Awaited || task.status != TaskStatus::Unassigned {
            tracing::warn!(
                request,
                task = task_id,
                request_status = ?req.status,
                task_status = %task.status,
                "ignoring response to stale request"
            );
            return Err(DispatchError::StaleRequest(request));
        }

        req.status = decision.into();
        req.responded_at = Some(Utc::now());
        let action = match decision {
            Decision::Accepted => {
                task.status = TaskStatus::Assigned;
                task.scout = Some(req.scout_id);
                tracing::info!(request, task = task_id, scout = req.scout_id, "offer accepted");
                "accept"
            }
            Decision::Rejected => {
                tracing::info!(
                    request,
                    task = task_id,
                    scout = req.scout_id,
                    pass_on = req.pass_to_another_scout,
                    "offer rejected"
                );
                "reject"
            }
        };
        let resolved = req.clone();
        self.record_audit(task_id, Some(request), Some(resolved.scout_id), action, None);
        Ok(resolved)
    }

    /// Mark an assigned task complete and credit its earning to the scout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the task is assigned.
    pub fn complete(&self, task: TaskId, remark: Option<String>) -> Result<Task, DispatchError> {
        let entry = self.store.entry(task)?;
        let mut entry = entry.lock();
        let scout = require_assigned(&entry.task, "completed")?;

        entry.task.status = TaskStatus::Complete;
        entry.task.scout = None;
        entry.task.completed_by = Some(scout);
        if remark.is_some() {
            entry.task.remark = remark;
        }
        if let Err(e) = self
            .scouts
            .credit_earning(scout, task, entry.task.earning)
        {
            tracing::error!(task, scout, error = %e, "failed to credit earning");
        }
        tracing::info!(task, scout, "task completed");
        self.record_audit(task, None, Some(scout), "complete", None);
        Ok(entry.task.clone())
    }

    /// Hand an assigned task back: it becomes unassigned and the scout's latest
    /// request for it is marked rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the task is assigned.
    pub fn unassign(&self, task: TaskId) -> Result<Task, DispatchError> {
        let entry = self.store.entry(task)?;
        let mut entry = entry.lock();
        let scout = require_assigned(&entry.task, "unassigned")?;

        entry.task.status = TaskStatus::Unassigned;
        entry.task.scout = None;
        let request = entry.latest_for_scout_mut(scout).map(|r| {
            r.status = RequestStatus::Rejected;
            r.responded_at.get_or_insert_with(Utc::now);
            r.id
        });
        tracing::info!(task, scout, ?request, "task given back");
        self.record_audit(task, request, Some(scout), "unassign", None);
        Ok(entry.task.clone())
    }

    /// Cancel an open task and notify the scout it was assigned to, if any.
    ///
    /// An awaited offer is resolved as rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the task is already complete or cancelled.
    pub fn cancel(&self, task: TaskId, reason: &str) -> Result<Task, DispatchError> {
        let entry = self.store.entry(task)?;
        let mut entry = entry.lock();
        let status = entry.task.status;
        if !matches!(status, TaskStatus::Unassigned | TaskStatus::Assigned) {
            tracing::warn!(task, %status, "cannot cancel task");
            return Err(DispatchError::InvalidTransition {
                task,
                action: "cancelled",
                status,
            });
        }

        let previous = entry.task.scout.take();
        entry.task.status = TaskStatus::Cancelled;
        if let Some(req) = entry.awaited_mut() {
            req.status = RequestStatus::Rejected;
            req.responded_at = Some(Utc::now());
        }
        tracing::info!(task, ?previous, reason, "task cancelled");

        if let Some(scout) = previous {
            let category = if entry.task.category == HOUSE_VISIT {
                NotificationCategory::HouseVisitCancelled
            } else {
                NotificationCategory::TaskCancelled
            };
            self.emit(scout, category, &entry.task, reason);
        }
        self.record_audit(task, None, previous, "cancel", Some(reason.to_string()));
        Ok(entry.task.clone())
    }

    /// Record the requester's rating of a completed task.
    ///
    /// Each review tag is toggled on both the task and the scout: present tags
    /// are removed, absent ones added.
    ///
    /// # Errors
    ///
    /// - `RatingOutOfRange` unless `1 <= rating <= 5`
    /// - `AlreadyRated` when the task was rated before
    /// - `InvalidTransition` unless the task is complete
    /// - `UnauthorizedRater` when `identity` did not request the task
    /// - `Collaborator` when the requester record cannot be resolved
    pub fn rate(
        &self,
        task: TaskId,
        identity: &str,
        rating: u8,
        review_tags: &[String],
        remarks: Option<String>,
    ) -> Result<RatingSummary, DispatchError> {
        if !(1..=5).contains(&rating) {
            return Err(DispatchError::RatingOutOfRange(rating));
        }
        let entry = self.store.entry(task)?;
        let mut entry = entry.lock();
        if entry.task.rating_given {
            return Err(DispatchError::AlreadyRated(task));
        }
        let status = entry.task.status;
        let Some(scout) = entry.task.scout_for_rating() else {
            return Err(DispatchError::InvalidTransition {
                task,
                action: "rated",
                status,
            });
        };

        match self.requesters.is_requester_for(&entry.task, identity) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(task, identity, "rating refused: not the requester");
                return Err(DispatchError::UnauthorizedRater(identity.to_string()));
            }
            Err(e) => {
                tracing::error!(task, identity, error = %e, "requester check failed");
                return Err(e);
            }
        }

        let scout = self.scouts.record_rating(scout, rating, review_tags)?;
        let task_ref = &mut entry.task;
        task_ref.rating = Some(rating);
        task_ref.remarks = remarks;
        toggle_tags(&mut task_ref.review_tags, review_tags);
        task_ref.rating_given = true;
        tracing::info!(task, scout = scout.id, rating, "task rated");
        self.record_audit(task, None, Some(scout.id), "rate", Some(rating.to_string()));
        Ok(RatingSummary {
            rating: scout.rating,
            remarks: task_ref.remarks.clone(),
        })
    }

    /// Resolve awaited requests created at or before `now - ttl` as rejected.
    ///
    /// Returns the affected task ids; re-offering them is left to the caller.
    /// A `ttl` reaching before the earliest representable time expires nothing.
    pub fn expire_stale(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<TaskId> {
        let Some(cutoff) = now.checked_sub_signed(ttl) else {
            tracing::warn!(ttl_secs = ttl.num_seconds(), "offer ttl out of range, nothing expired");
            return Vec::new();
        };
        let mut expired = Vec::new();
        for task in self.store.awaited_before(cutoff) {
            let Ok(entry) = self.store.entry(task) else {
                continue;
            };
            let mut entry = entry.lock();
            // Re-check under the lock; the scout may have answered meanwhile.
            let Some(req) = entry.awaited_mut().filter(|r| r.created_at <= cutoff) else {
                continue;
            };
            req.status = RequestStatus::Rejected;
            req.responded_at = Some(now);
            let (request, scout) = (req.id, req.scout_id);
            tracing::info!(task, request, scout, "offer expired");
            self.record_audit(task, Some(request), Some(scout), "expire", None);
            expired.push(task);
        }
        if !expired.is_empty() {
            tracing::warn!(count = expired.len(), "expired stale offers");
        }
        expired
    }

    fn gather(&self) -> Gathered {
        Gathered {
            candidates: self.scouts.active_scouts(),
            open_tasks: self.store.open_task_counts(),
            assigned: self.store.assigned_schedule(self.limits.conflict_window),
        }
    }

    fn select_locked<'g>(
        &self,
        entry: &TaskEntry,
        gathered: &'g Gathered,
        excluded: &HashSet<ScoutId>,
    ) -> Option<&'g Scout> {
        let schedule = ConflictCheck {
            assigned: gathered.assigned.clone(),
            availability: self.schedule.as_ref(),
        };
        let ctx = SelectionContext {
            excluded,
            open_tasks: &gathered.open_tasks,
            schedule: &schedule,
        };
        self.selector.select(&entry.task, &gathered.candidates, &ctx)
    }

    fn check_offerable(&self, entry: &TaskEntry) -> Result<(), DispatchError> {
        let task = &entry.task;
        if task.status != TaskStatus::Unassigned {
            return Err(DispatchError::InvalidTransition {
                task: task.id,
                action: "offered",
                status: task.status,
            });
        }
        if entry.awaited().is_some() {
            return Err(DispatchError::RequestPending(task.id));
        }
        if entry.requests.len() >= self.limits.max_offers_per_task {
            tracing::warn!(
                task = task.id,
                limit = self.limits.max_offers_per_task,
                "offer limit reached"
            );
            return Err(DispatchError::OfferLimitReached {
                task: task.id,
                limit: self.limits.max_offers_per_task,
            });
        }
        Ok(())
    }

    fn offer_locked(
        &self,
        entry: &mut TaskEntry,
        scout: ScoutId,
        pass_to_another_scout: bool,
    ) -> Result<AssignmentRequest, DispatchError> {
        self.check_offerable(entry)?;
        let request = AssignmentRequest {
            id: self.store.next_request_id(),
            task_id: entry.task.id,
            scout_id: scout,
            status: RequestStatus::Awaited,
            created_at: Utc::now(),
            responded_at: None,
            pass_to_another_scout,
        };
        self.store.index_request(request.id, request.task_id);
        entry.requests.push(request.clone());
        tracing::info!(
            task = request.task_id,
            request = request.id,
            scout,
            pass_to_another_scout,
            "task offered"
        );
        self.record_audit(request.task_id, Some(request.id), Some(scout), "offer", None);
        Ok(request)
    }

    fn emit(&self, scout: ScoutId, category: NotificationCategory, task: &Task, reason: &str) {
        let payload = match serde_json::to_value(CancelledTaskPayload { task, reason }) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(task = task.id, error = %e, "failed to encode notification");
                return;
            }
        };
        if let Err(e) = self.notifier.lock().notify(scout, category, payload) {
            tracing::error!(task = task.id, scout, error = %e, "failed to deliver notification");
        }
    }

    fn record_audit(
        &self,
        task: TaskId,
        request: Option<RequestId>,
        scout: Option<ScoutId>,
        action: &str,
        payload: Option<String>,
    ) {
        if let Some(sink) = &self.audit {
            sink.lock()
                .record(build_audit_event(task, request, scout, action, payload));
        }
    }
}

struct Gathered {
    candidates: Vec<Scout>,
    open_tasks: HashMap<ScoutId, usize>,
    assigned: AssignedSchedule,
}

fn require_assigned(task: &Task, action: &'static str) -> Result<ScoutId, DispatchError> {
    match (task.status, task.scout) {
        (TaskStatus::Assigned, Some(scout)) => Ok(scout),
        (status, _) => {
            tracing::warn!(task = task.id, %status, action, "invalid transition");
            Err(DispatchError::InvalidTransition {
                task: task.id,
                action,
                status,
            })
        }
    }
}
