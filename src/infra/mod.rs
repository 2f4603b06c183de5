//! Infrastructure adapters for notifications, schedules and identity checks.

pub mod identity;
pub mod notify;
pub mod schedule;

pub use identity::RequesterRegistry;
pub use notify::{FileNotifier, InMemoryNotifier};
pub use schedule::{AvailabilityBook, AvailabilityWindow};
