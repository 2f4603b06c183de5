//! In-memory notification backend.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::core::{DispatchError, Notification, NotificationCategory, Notifier, ScoutId};

/// Simple in-memory notifier for development/testing.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    notifications: HashMap<ScoutId, Vec<Notification>>,
}

impl InMemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications the scout has not listed yet.
    #[must_use]
    pub fn unseen(&self, scout: ScoutId) -> usize {
        self.notifications
            .get(&scout)
            .map_or(0, |n| n.iter().filter(|n| !n.seen).count())
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(
        &mut self,
        scout: ScoutId,
        category: NotificationCategory,
        payload: serde_json::Value,
    ) -> Result<Notification, DispatchError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            scout_id: scout,
            category,
            payload,
            seen: false,
            created_at: Utc::now(),
        };
        self.notifications
            .entry(scout)
            .or_default()
            .push(notification.clone());
        Ok(notification)
    }

    fn list(&mut self, scout: ScoutId, limit: usize) -> Result<Vec<Notification>, DispatchError> {
        Ok(take_newest_and_mark_seen(
            self.notifications.get_mut(&scout),
            limit,
        ))
    }
}

/// Newest first, capped at `limit`; every notification of the scout becomes seen.
pub(crate) fn take_newest_and_mark_seen(
    notifications: Option<&mut Vec<Notification>>,
    limit: usize,
) -> Vec<Notification> {
    let Some(notifications) = notifications else {
        return Vec::new();
    };
    let listed = notifications.iter().rev().take(limit).cloned().collect();
    for n in notifications.iter_mut() {
        n.seen = true;
    }
    listed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_newest_first_and_marks_seen() {
        let mut notifier = InMemoryNotifier::new();
        for i in 0..3 {
            notifier
                .notify(1, NotificationCategory::TaskCancelled, serde_json::json!({ "n": i }))
                .unwrap();
        }
        assert_eq!(notifier.unseen(1), 3);

        let listed = notifier.list(1, 2).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].payload["n"], 2);
        assert!(listed.iter().all(|n| !n.seen));
        assert_eq!(notifier.unseen(1), 0);
        assert!(notifier.list(2, 10).unwrap().is_empty());
    }
}
