//! Scout directory: agent records, ratings, review tags and wallets.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::model::{toggle_tags, ScoutId, TaskId};
use super::DispatchError;

/// A field agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scout {
    /// Scout identifier.
    pub id: ScoutId,
    /// Display name.
    pub name: String,
    /// Unique phone number.
    pub phone_no: String,
    /// Eligible for new work.
    pub active: bool,
    /// Mean of received ratings, or the configured default before the first one.
    pub rating: f64,
    /// Number of ratings folded into `rating`.
    pub ratings_received: u32,
    /// Accumulated feedback labels.
    pub review_tags: BTreeSet<String>,
}

/// A single earning credited to a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletCredit {
    /// Completed task the credit pays for.
    pub task_id: TaskId,
    /// Amount credited.
    pub amount: f64,
    /// Credit time.
    pub credited_at: DateTime<Utc>,
}

/// Earnings of one scout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Sum of all credits.
    pub balance: f64,
    /// Credits, oldest first.
    pub credits: Vec<WalletCredit>,
}

struct ScoutRecord {
    scout: Scout,
    wallet: Wallet,
}

/// Registry of scouts. Reads are shared; each mutation takes the write lock briefly.
pub struct ScoutDirectory {
    scouts: RwLock<HashMap<ScoutId, ScoutRecord>>,
    next_id: AtomicU64,
    default_rating: f64,
}

impl ScoutDirectory {
    /// Create an empty directory; unrated scouts report `default_rating`.
    #[must_use]
    pub fn new(default_rating: f64) -> Self {
        Self {
            scouts: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            default_rating,
        }
    }

    /// Register a new, inactive scout.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::DuplicateScout` when the phone number is taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        phone_no: impl Into<String>,
    ) -> Result<ScoutId, DispatchError> {
        let phone_no = phone_no.into();
        let mut scouts = self.scouts.write();
        if scouts.values().any(|r| r.scout.phone_no == phone_no) {
            return Err(DispatchError::DuplicateScout(phone_no));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        scouts.insert(
            id,
            ScoutRecord {
                scout: Scout {
                    id,
                    name: name.into(),
                    phone_no,
                    active: false,
                    rating: self.default_rating,
                    ratings_received: 0,
                    review_tags: BTreeSet::new(),
                },
                wallet: Wallet::default(),
            },
        );
        tracing::info!(scout = id, "scout registered");
        Ok(id)
    }

    /// Go online or offline.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown scouts.
    pub fn set_active(&self, id: ScoutId, active: bool) -> Result<(), DispatchError> {
        let mut scouts = self.scouts.write();
        let record = scouts.get_mut(&id).ok_or_else(|| not_found(id))?;
        record.scout.active = active;
        tracing::info!(scout = id, active, "scout activity changed");
        Ok(())
    }

    /// Snapshot of one scout.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown scouts.
    pub fn get(&self, id: ScoutId) -> Result<Scout, DispatchError> {
        self.scouts
            .read()
            .get(&id)
            .map(|r| r.scout.clone())
            .ok_or_else(|| not_found(id))
    }

    /// True when the scout exists.
    #[must_use]
    pub fn contains(&self, id: ScoutId) -> bool {
        self.scouts.read().contains_key(&id)
    }

    /// Snapshot of every active scout, ordered by id.
    #[must_use]
    pub fn active_scouts(&self) -> Vec<Scout> {
        let mut active: Vec<Scout> = self
            .scouts
            .read()
            .values()
            .filter(|r| r.scout.active)
            .map(|r| r.scout.clone())
            .collect();
        active.sort_by_key(|s| s.id);
        active
    }

    /// Fold a rating into the scout's mean and toggle the given review tags.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown scouts.
    pub fn record_rating(
        &self,
        id: ScoutId,
        rating: u8,
        review_tags: &[String],
    ) -> Result<Scout, DispatchError> {
        let mut scouts = self.scouts.write();
        let scout = &mut scouts.get_mut(&id).ok_or_else(|| not_found(id))?.scout;
        let received = f64::from(scout.ratings_received);
        scout.rating = if scout.ratings_received == 0 {
            f64::from(rating)
        } else {
            scout.rating.mul_add(received, f64::from(rating)) / (received + 1.0)
        };
        scout.ratings_received += 1;
        toggle_tags(&mut scout.review_tags, review_tags);
        Ok(scout.clone())
    }

    /// Credit a task's earning to the scout's wallet.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown scouts.
    pub fn credit_earning(
        &self,
        id: ScoutId,
        task_id: TaskId,
        amount: f64,
    ) -> Result<(), DispatchError> {
        let mut scouts = self.scouts.write();
        let wallet = &mut scouts.get_mut(&id).ok_or_else(|| not_found(id))?.wallet;
        wallet.balance += amount;
        wallet.credits.push(WalletCredit {
            task_id,
            amount,
            credited_at: Utc::now(),
        });
        tracing::debug!(scout = id, task = task_id, amount, "earning credited");
        Ok(())
    }

    /// Snapshot of the scout's wallet.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown scouts.
    pub fn wallet(&self, id: ScoutId) -> Result<Wallet, DispatchError> {
        self.scouts
            .read()
            .get(&id)
            .map(|r| r.wallet.clone())
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: ScoutId) -> DispatchError {
    DispatchError::NotFound(format!("scout {id}"))
}
