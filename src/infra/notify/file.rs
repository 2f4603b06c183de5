//! File-backed notification backend.

use std::collections::HashMap;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use super::memory::take_newest_and_mark_seen;
use crate::core::{DispatchError, Notification, NotificationCategory, Notifier, ScoutId};

/// Notifier persisting every notification as a JSON line.
///
/// `seen` flags live in memory only; a reload shows every notification unseen.
pub struct FileNotifier {
    path: PathBuf,
    notifications: HashMap<ScoutId, Vec<Notification>>,
}

impl FileNotifier {
    /// Open (or create) the notification log under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Backend` when the directory or log cannot be read.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let dir = dir.as_ref();
        create_dir_all(dir).map_err(backend)?;
        let mut notifier = Self {
            path: dir.join("notifications.jsonl"),
            notifications: HashMap::new(),
        };
        notifier.load_from_disk()?;
        Ok(notifier)
    }

    fn load_from_disk(&mut self) -> Result<(), DispatchError> {
        if !self.path.exists() {
            return Ok(());
        }
        let file = OpenOptions::new().read(true).open(&self.path).map_err(backend)?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(backend)?;
            if line.trim().is_empty() {
                continue;
            }
            let notification: Notification = serde_json::from_str(&line).map_err(backend)?;
            self.notifications
                .entry(notification.scout_id)
                .or_default()
                .push(notification);
        }
        Ok(())
    }

    fn append_to_disk(&self, notification: &Notification) -> Result<(), DispatchError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(backend)?;
        let line = serde_json::to_string(notification).map_err(backend)?;
        writeln!(file, "{line}").map_err(backend)
    }
}

impl Notifier for FileNotifier {
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
        self.append_to_disk(&notification)?;
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

fn backend(e: impl std::fmt::Display) -> DispatchError {
    DispatchError::Backend(e.to_string())
}
