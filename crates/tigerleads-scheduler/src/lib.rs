//! Periodic passes for Tiger Leads.
//!
//! The lifecycle pass moves jobs between review states; the unlock-cap pass
//! retires leads that enough users of one trade have unlocked. Each runs on
//! its own [`PeriodicWorker`].

pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod unlock_cap;
pub mod worker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::PassError;
pub use lifecycle::LifecycleProcessor;
pub use unlock_cap::UnlockCapEnforcer;
pub use worker::{PeriodicPass, PeriodicWorker};

#[cfg(test)]
pub(crate) mod testing;
