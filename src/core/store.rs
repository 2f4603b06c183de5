//! Task store with per-task mutual exclusion.
//!
//! Each task and its assignment requests live in one `TaskEntry` behind its own
//! `parking_lot::Mutex`. The outer map lock is only held to look entries up, so
//! operations on different tasks never contend. Code must never hold two entry
//! locks at once; scans lock entries one at a time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};

use super::catalog::TaskCategory;
use super::model::{
    AssignmentRequest, RequestId, RequestStatus, ScoutId, Task, TaskId, TaskLinkage, TaskStatus,
};
use super::DispatchError;

/// A task together with every request ever made for it.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// The task.
    pub task: Task,
    /// Requests in creation order.
    pub requests: Vec<AssignmentRequest>,
}

impl TaskEntry {
    /// The request still waiting for an answer, if any.
    #[must_use]
    pub fn awaited(&self) -> Option<&AssignmentRequest> {
        self.requests
            .iter()
            .rev()
            .find(|r| r.status == RequestStatus::Awaited)
    }

    /// Mutable access to the awaited request.
    pub fn awaited_mut(&mut self) -> Option<&mut AssignmentRequest> {
        self.requests
            .iter_mut()
            .rev()
            .find(|r| r.status == RequestStatus::Awaited)
    }

    /// A request by id.
    #[must_use]
    pub fn request(&self, id: RequestId) -> Option<&AssignmentRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Most recent request made to the given scout.
    pub fn latest_for_scout_mut(&mut self, scout: ScoutId) -> Option<&mut AssignmentRequest> {
        self.requests.iter_mut().rev().find(|r| r.scout_id == scout)
    }
}

/// Owner of all tasks and assignment requests.
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, Arc<Mutex<TaskEntry>>>>,
    request_index: RwLock<HashMap<RequestId, TaskId>>,
    next_task_id: AtomicU64,
    next_request_id: AtomicU64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            request_index: RwLock::new(HashMap::new()),
            next_task_id: AtomicU64::new(1),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Create and store an unassigned task.
    pub fn create(
        &self,
        category: &TaskCategory,
        linkage: TaskLinkage,
        scheduled_at: DateTime<Utc>,
    ) -> Task {
        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let task = Task::new(id, category, linkage, scheduled_at);
        self.tasks.write().insert(
            id,
            Arc::new(Mutex::new(TaskEntry {
                task: task.clone(),
                requests: Vec::new(),
            })),
        );
        task
    }

    /// Shared handle to a task's entry; lock it to read or mutate.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown tasks.
    pub fn entry(&self, id: TaskId) -> Result<Arc<Mutex<TaskEntry>>, DispatchError> {
        self.tasks
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("task {id}")))
    }

    /// Allocate the next request id.
    pub fn next_request_id(&self) -> RequestId {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Remember which task a request belongs to.
    pub fn index_request(&self, request: RequestId, task: TaskId) {
        self.request_index.write().insert(request, task);
    }

    /// Task a request belongs to.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown requests.
    pub fn task_for_request(&self, request: RequestId) -> Result<TaskId, DispatchError> {
        self.request_index
            .read()
            .get(&request)
            .copied()
            .ok_or_else(|| DispatchError::NotFound(format!("assignment request {request}")))
    }

    fn entries(&self) -> Vec<Arc<Mutex<TaskEntry>>> {
        self.tasks.read().values().cloned().collect()
    }

    /// Snapshot of every task, ordered by id.
    #[must_use]
    pub fn all_tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.entries().iter().map(|e| e.lock().task.clone()).collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// A scout's assigned tasks ordered by `scheduled_at`.
    #[must_use]
    pub fn assigned_to(&self, scout: ScoutId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .all_tasks()
            .into_iter()
            .filter(|t| t.status == TaskStatus::Assigned && t.scout == Some(scout))
            .collect();
        tasks.sort_by_key(|t| t.scheduled_at);
        tasks
    }

    /// Number of assigned tasks per scout.
    #[must_use]
    pub fn open_task_counts(&self) -> HashMap<ScoutId, usize> {
        let mut counts = HashMap::new();
        for task in self.all_tasks() {
            if let (TaskStatus::Assigned, Some(scout)) = (task.status, task.scout) {
                *counts.entry(scout).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Scheduled times of every assigned task, grouped by scout.
    #[must_use]
    pub fn assigned_schedule(&self, window: Duration) -> AssignedSchedule {
        let mut by_scout: HashMap<ScoutId, Vec<DateTime<Utc>>> = HashMap::new();
        for task in self.all_tasks() {
            if let (TaskStatus::Assigned, Some(scout)) = (task.status, task.scout) {
                by_scout.entry(scout).or_default().push(task.scheduled_at);
            }
        }
        AssignedSchedule { by_scout, window }
    }

    /// First task matching the predicate, by id.
    pub fn find(&self, predicate: impl Fn(&Task) -> bool) -> Option<Task> {
        self.all_tasks().into_iter().find(|t| predicate(t))
    }

    /// Ids of tasks holding an awaited request created at or before `cutoff`.
    #[must_use]
    pub fn awaited_before(&self, cutoff: DateTime<Utc>) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .entries()
            .iter()
            .filter_map(|e| {
                let entry = e.lock();
                entry
                    .awaited()
                    .filter(|r| r.created_at <= cutoff)
                    .map(|_| entry.task.id)
            })
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Point-in-time view of when scouts are already busy.
#[derive(Debug, Clone, Default)]
pub struct AssignedSchedule {
    by_scout: HashMap<ScoutId, Vec<DateTime<Utc>>>,
    window: Duration,
}

impl AssignedSchedule {
    /// True when the scout holds an assigned task closer than the window to `at`.
    #[must_use]
    pub fn is_busy(&self, scout: ScoutId, at: DateTime<Utc>) -> bool {
        self.by_scout.get(&scout).is_some_and(|times| {
            times
                .iter()
                .any(|t| (*t - at).abs() < self.window)
        })
    }
}
