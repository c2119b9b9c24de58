//! Unlock-cap pass.

use std::sync::Arc;

use async_trait::async_trait;
use tigerleads_config::UnlockCapConfig;
use tigerleads_core::{CapReport, PassOutcome};
use tigerleads_db::LifecycleRepo;
use tracing::{debug, info};

use crate::error::PassError;
use crate::worker::PeriodicPass;

pub struct UnlockCapEnforcer {
    repo: Arc<dyn LifecycleRepo>,
    threshold: u32,
    lock_key: i64,
}

impl UnlockCapEnforcer {
    pub fn new(repo: Arc<dyn LifecycleRepo>, config: &UnlockCapConfig) -> Self {
        Self {
            repo,
            threshold: config.threshold,
            lock_key: config.lock_key,
        }
    }

    pub async fn run_pass(&self) -> Result<PassOutcome<CapReport>, PassError> {
        let outcome = self
            .repo
            .enforce_unlock_cap(self.threshold, self.lock_key)
            .await
            .map_err(PassError::database("unlock-cap"))?;

        match &outcome {
            PassOutcome::Ran(report) => info!(
                threshold = self.threshold,
                deleted = report.deleted,
                completed = report.completed,
                "Unlock-cap pass complete"
            ),
            PassOutcome::Skipped => {
                debug!(lock_key = self.lock_key, "Unlock-cap pass skipped, lock held elsewhere")
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl PeriodicPass for UnlockCapEnforcer {
    fn name(&self) -> &'static str {
        "unlock-cap"
    }

    async fn run_once(&self) -> Result<(), PassError> {
        self.run_pass().await.map(|_| ())
    }
}
