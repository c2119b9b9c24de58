//! Periodic worker that runs one pass on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::error::PassError;

/// A unit of periodic work.
#[async_trait]
pub trait PeriodicPass: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run_once(&self) -> Result<(), PassError>;
}

/// Runs a pass immediately, then once per interval, until shutdown.
///
/// A tick that overruns the interval delays the next one. Failures are
/// logged and the schedule carries on.
pub struct PeriodicWorker {
    pass: Arc<dyn PeriodicPass>,
    interval: Duration,
}

impl PeriodicWorker {
    pub fn new(pass: Arc<dyn PeriodicPass>, interval: Duration) -> Self {
        Self { pass, interval }
    }

    /// Run the worker loop until `shutdown` flips to `true` or its sender drops.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let name = self.pass.name();
        info!(pass = name, interval_secs = self.interval.as_secs(), "Starting periodic worker");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.pass.run_once().await {
                        error!(pass = name, error = %e, "Periodic pass failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(pass = name, "Periodic worker stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
