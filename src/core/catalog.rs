//! Task category registry.
//!
//! Categories are reference data: built once from configuration and handed to the
//! dispatcher, never looked up from ambient state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DispatchError;

/// Category name for house visits.
pub const HOUSE_VISIT: &str = "House Visit";
/// Category name for tenant move-outs.
pub const MOVE_OUT: &str = "Move Out";
/// Category name for property onboarding.
pub const PROPERTY_ONBOARDING: &str = "Property Onboarding";

/// A kind of task with its payout and sub-task templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCategory {
    /// Unique name.
    pub name: String,
    /// Amount paid for completing a task of this kind.
    pub earning: f64,
    /// Sub-task templates copied onto each new task.
    pub sub_tasks: Vec<String>,
}

/// Read-only mapping from category name to category.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    categories: HashMap<String, TaskCategory>,
}

impl CategoryCatalog {
    /// Build a catalog; a later category replaces an earlier one with the same name.
    pub fn new(categories: impl IntoIterator<Item = TaskCategory>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
        }
    }

    /// Look up a category by name.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for unknown names.
    pub fn get(&self, name: &str) -> Result<&TaskCategory, DispatchError> {
        self.categories
            .get(name)
            .ok_or_else(|| DispatchError::NotFound(format!("task category `{name}`")))
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True when no category is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
