//! Runtime adapters: trigger intake and the background expiry sweep.

pub mod intake;
pub mod spawn;
#[cfg(feature = "tokio-runtime")]
pub mod sweeper;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

pub use intake::{handle_trigger, TriggerEvent, TriggerOutcome};
pub use spawn::Spawn;
#[cfg(feature = "tokio-runtime")]
pub use sweeper::{spawn_expiry_sweeper, sweep_once, MIN_SWEEP_INTERVAL, SweepReport, SweeperHandle};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;
