//! # Scout Dispatch
//!
//! Task assignment and response lifecycle for a field-service operations backend.
//!
//! Field agents ("scouts") perform house visits, tenant move-outs and property
//! onboarding. This crate decides which scout a task is offered to and drives the
//! offer through its lifecycle: acceptance, rejection, completion, cancellation and
//! the customer's rating afterwards.
//!
//! ## Key Features
//!
//! - **Typed State Machine**: `Task` and `AssignmentRequest` transitions are guarded
//!   by their current status and return a typed `DispatchError` on violation
//! - **Per-Task Locking**: every read-check-write sequence on a task runs under that
//!   task's own `parking_lot::Mutex`, so two responses to one request cannot both win
//! - **Pure Selection**: `RatingSelector` picks the best eligible scout without side effects
//! - **Bounded Re-offer**: a rejected task is passed on at most `max_offers_per_task` times
//! - **Injected Collaborators**: notifications, scheduling conflicts and requester
//!   identity checks are traits, with in-memory and file-backed adapters in `infra`
//! - **Expiry Sweep**: stale offers can be expired and re-offered on a tokio runtime
//!
//! ## Dispatcher
//!
//! ```rust,ignore
//! use scout_dispatch::builders::{build_dispatcher, default_notifier};
//! use scout_dispatch::config::DispatchConfig;
//! use scout_dispatch::core::{Decision, TaskLinkage, HOUSE_VISIT};
//! use scout_dispatch::infra::{AvailabilityBook, RequesterRegistry};
//!
//! let cfg = DispatchConfig::default();
//! let dispatcher = build_dispatcher(
//!     &cfg,
//!     default_notifier,
//!     Box::new(RequesterRegistry::new()),
//!     Box::new(AvailabilityBook::new()),
//! )?;
//!
//! let scout = dispatcher.scouts().register("Asha", "9990001111")?;
//! dispatcher.scouts().set_active(scout, true)?;
//!
//! let task = dispatcher.create_task(
//!     HOUSE_VISIT,
//!     TaskLinkage::HouseVisit { house_id: 7, visit_id: 42 },
//!     scheduled_at,
//! )?;
//! let request = dispatcher.assign_new(task)?;
//! dispatcher.respond(request.id, Decision::Accepted)?;
//! ```
//!
//! For complete scenarios, see `tests/lifecycle_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core domain model, selection policy and the assignment lifecycle.
pub mod core;
/// Configuration models for the dispatcher and its backends.
pub mod config;
/// Builders to construct a dispatcher from configuration.
pub mod builders;
/// Infrastructure adapters for notifications, schedules and identity checks.
pub mod infra;
/// Runtime adapters: trigger intake and the background expiry sweep.
pub mod runtime;
/// Shared utilities.
pub mod util;
