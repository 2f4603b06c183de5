//! Notification backends.

pub mod file;
pub mod memory;

pub use file::FileNotifier;
pub use memory::InMemoryNotifier;
