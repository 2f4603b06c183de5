//! Declared scout availability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::{DispatchError, ScheduleOracle, ScoutId};

/// A time range a scout declared themselves available in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Window identifier.
    pub id: u64,
    /// Owner.
    pub scout_id: ScoutId,
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Inclusive end.
    pub end: DateTime<Utc>,
    /// Withdrawn windows are kept but ignored.
    pub cancelled: bool,
}

impl AvailabilityWindow {
    fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !self.cancelled && self.start <= start && self.end >= end
    }
}

/// Availability windows per scout.
///
/// A scout with no live windows counts as always available; once windows exist,
/// any time outside all of them is a conflict.
#[derive(Default)]
pub struct AvailabilityBook {
    windows: RwLock<HashMap<ScoutId, Vec<AvailabilityWindow>>>,
    next_id: AtomicU64,
}

impl AvailabilityBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a window.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Collaborator` when `end` precedes `start` or an
    /// existing window already covers the range.
    pub fn add_window(
        &self,
        scout: ScoutId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AvailabilityWindow, DispatchError> {
        if end < start {
            return Err(DispatchError::Collaborator(
                "availability window ends before it starts".into(),
            ));
        }
        let mut windows = self.windows.write();
        let own = windows.entry(scout).or_default();
        if own.iter().any(|w| w.covers(start, end)) {
            return Err(DispatchError::Collaborator(
                "a scheduled availability already exists in given time range".into(),
            ));
        }
        let window = AvailabilityWindow {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            scout_id: scout,
            start,
            end,
            cancelled: false,
        };
        own.push(window.clone());
        Ok(window)
    }

    /// Withdraw a window.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` when the scout has no such live window.
    pub fn cancel_window(&self, scout: ScoutId, id: u64) -> Result<(), DispatchError> {
        self.windows
            .write()
            .get_mut(&scout)
            .and_then(|own| own.iter_mut().find(|w| w.id == id && !w.cancelled))
            .map(|w| w.cancelled = true)
            .ok_or_else(|| DispatchError::NotFound(format!("availability window {id}")))
    }

    /// Live windows ending at or after `now`, ordered by start.
    #[must_use]
    pub fn upcoming(&self, scout: ScoutId, now: DateTime<Utc>) -> Vec<AvailabilityWindow> {
        let mut own: Vec<AvailabilityWindow> = self
            .windows
            .read()
            .get(&scout)
            .map(|own| {
                own.iter()
                    .filter(|w| !w.cancelled && w.end >= now)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        own.sort_by_key(|w| w.start);
        own
    }
}

impl ScheduleOracle for AvailabilityBook {
    fn has_conflict(&self, scout: ScoutId, at: DateTime<Utc>) -> bool {
        let windows = self.windows.read();
        let Some(own) = windows.get(&scout) else {
            return false;
        };
        let mut live = own.iter().filter(|w| !w.cancelled).peekable();
        live.peek().is_some() && !live.any(|w| w.start <= at && at <= w.end)
    }
}
