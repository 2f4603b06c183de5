//! Configuration models for the dispatcher and its backends.

pub mod dispatch;

pub use dispatch::{CategoryConfig, DispatchConfig, NotifierBackendConfig, CONFIG_ENV, MAX_REQUEST_TTL_SECS};
