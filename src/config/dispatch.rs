//! Dispatcher configuration structures.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{
    AppResult, DispatchLimits, TaskCategory, HOUSE_VISIT, MOVE_OUT, PROPERTY_ONBOARDING,
};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "SCOUT_DISPATCH_CONFIG";

/// Longest accepted offer TTL: 30 days.
pub const MAX_REQUEST_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Notification backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum NotifierBackendConfig {
    /// In-memory notifier for development/testing.
    InMemory,
    /// JSON-lines log under `path`.
    File {
        /// Directory holding the log.
        path: PathBuf,
    },
}

/// One task category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Unique category name.
    pub name: String,
    /// Amount paid per completed task.
    pub earning: f64,
    /// Sub-task templates.
    #[serde(default)]
    pub sub_tasks: Vec<String>,
}

impl From<&CategoryConfig> for TaskCategory {
    fn from(cfg: &CategoryConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            earning: cfg.earning,
            sub_tasks: cfg.sub_tasks.clone(),
        }
    }
}

/// Root dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum offers ever made for one task.
    #[serde(default = "default_max_offers")]
    pub max_offers_per_task: usize,
    /// Age in seconds after which an awaited offer may be expired.
    #[serde(default)]
    pub request_ttl_secs: Option<u64>,
    /// Minimum spacing between two tasks of one scout.
    #[serde(default = "default_conflict_window")]
    pub conflict_window_minutes: u32,
    /// Rating reported for scouts nobody rated yet.
    #[serde(default = "default_rating")]
    pub default_scout_rating: f64,
    /// Log every transition through `tracing` as an audit event.
    #[serde(default)]
    pub audit_log: bool,
    /// Task categories.
    pub categories: Vec<CategoryConfig>,
    /// Notification backend.
    #[serde(default = "default_notifications")]
    pub notifications: NotifierBackendConfig,
}

const fn default_max_offers() -> usize {
    5
}

const fn default_conflict_window() -> u32 {
    60
}

const fn default_rating() -> f64 {
    5.0
}

const fn default_notifications() -> NotifierBackendConfig {
    NotifierBackendConfig::InMemory
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let category = |name: &str, earning: f64, sub_tasks: &[&str]| CategoryConfig {
            name: name.to_string(),
            earning,
            sub_tasks: sub_tasks.iter().map(|s| (*s).to_string()).collect(),
        };
        Self {
            max_offers_per_task: default_max_offers(),
            request_ttl_secs: None,
            conflict_window_minutes: default_conflict_window(),
            default_scout_rating: default_rating(),
            audit_log: false,
            categories: vec![
                category(HOUSE_VISIT, 100.0, &["Meet customer", "Show house"]),
                category(
                    MOVE_OUT,
                    150.0,
                    &["Inspect property", "Collect keys", "Record meter readings"],
                ),
                category(
                    PROPERTY_ONBOARDING,
                    200.0,
                    &["Verify owner", "Photograph property", "Collect amenities"],
                ),
            ],
            notifications: default_notifications(),
        }
    }
}

impl DispatchConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_offers_per_task == 0 {
            return Err("max_offers_per_task must be greater than 0".into());
        }
        match self.request_ttl_secs {
            Some(0) => return Err("request_ttl_secs must be greater than 0 when set".into()),
            Some(secs) if secs > MAX_REQUEST_TTL_SECS => {
                return Err(format!(
                    "request_ttl_secs must not exceed {MAX_REQUEST_TTL_SECS}"
                ))
            }
            _ => {}
        }
        if self.conflict_window_minutes == 0 {
            return Err("conflict_window_minutes must be greater than 0".into());
        }
        if !(1.0..=5.0).contains(&self.default_scout_rating) {
            return Err("default_scout_rating must lie between 1 and 5".into());
        }
        if self.categories.is_empty() {
            return Err("at least one category must be defined".into());
        }
        let mut names = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err("category name must not be empty".into());
            }
            if !names.insert(category.name.as_str()) {
                return Err(format!("category `{}` defined twice", category.name));
            }
            if category.earning < 0.0 {
                return Err(format!(
                    "category `{}` invalid: earning must not be negative",
                    category.name
                ));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `.env`, then read the file named by `SCOUT_DISPATCH_CONFIG`.
    ///
    /// Falls back to the defaults when the variable is unset.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, parsed or validated.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        let Ok(path) = std::env::var(CONFIG_ENV) else {
            tracing::debug!("{CONFIG_ENV} not set, using default configuration");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading dispatch config from {path}"))?;
        Self::from_json_str(&raw).map_err(|e| anyhow::anyhow!("config `{path}` invalid: {e}"))
    }

    /// Lifecycle limits derived from this configuration.
    #[must_use]
    pub fn limits(&self) -> DispatchLimits {
        DispatchLimits {
            max_offers_per_task: self.max_offers_per_task,
            conflict_window: chrono::Duration::minutes(i64::from(self.conflict_window_minutes)),
        }
    }

    /// Request TTL as a duration, when configured.
    ///
    /// `None` also for values `validate` rejects as out of range.
    #[must_use]
    pub fn request_ttl(&self) -> Option<chrono::Duration> {
        self.request_ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }
}
