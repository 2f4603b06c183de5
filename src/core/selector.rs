//! Scout selection policy.
//!
//! Selection is a pure decision over state the caller gathered beforehand: it never
//! locks, never writes and never fails. No eligible scout is a normal `None`.

use std::collections::{HashMap, HashSet};

use super::collaborators::ScheduleOracle;
use super::directory::Scout;
use super::model::{ScoutId, Task, TaskStatus};

/// Everything besides the candidates that selection depends on.
pub struct SelectionContext<'a> {
    /// Scouts that must not receive this offer (awaited or already offered).
    pub excluded: &'a HashSet<ScoutId>,
    /// Assigned task count per scout, used as a tie-break.
    pub open_tasks: &'a HashMap<ScoutId, usize>,
    /// Scheduling-conflict check.
    pub schedule: &'a dyn ScheduleOracle,
}

/// Policy deciding which eligible scout receives an offer.
pub trait ScoutSelector: Send + Sync {
    /// Pick at most one scout from `candidates` for `task`.
    fn select<'s>(
        &self,
        task: &Task,
        candidates: &'s [Scout],
        ctx: &SelectionContext<'_>,
    ) -> Option<&'s Scout>;
}

/// Highest rating wins; ties go to the fewest open tasks, then the lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingSelector;

impl ScoutSelector for RatingSelector {
    fn select<'s>(
        &self,
        task: &Task,
        candidates: &'s [Scout],
        ctx: &SelectionContext<'_>,
    ) -> Option<&'s Scout> {
        if task.status != TaskStatus::Unassigned {
            return None;
        }
        let open = |s: &Scout| ctx.open_tasks.get(&s.id).copied().unwrap_or(0);
        candidates
            .iter()
            .filter(|s| s.active)
            .filter(|s| !ctx.excluded.contains(&s.id))
            .filter(|s| !ctx.schedule.has_conflict(s.id, task.scheduled_at))
            .min_by(|a, b| {
                b.rating
                    .total_cmp(&a.rating)
                    .then_with(|| open(a).cmp(&open(b)))
                    .then_with(|| a.id.cmp(&b.id))
            })
    }
}
