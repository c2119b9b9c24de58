//! Lifecycle pass: scheduled posting, approval delay, expiry and cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use tigerleads_config::LifecycleConfig;
use tigerleads_core::{PassOutcome, PermitStatusAllowList, TransitionReport};
use tigerleads_db::LifecycleRepo;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::PassError;
use crate::worker::PeriodicPass;

pub struct LifecycleProcessor {
    repo: Arc<dyn LifecycleRepo>,
    clock: Arc<dyn Clock>,
    allowed: PermitStatusAllowList,
    lock_key: i64,
}

impl LifecycleProcessor {
    pub fn new(repo: Arc<dyn LifecycleRepo>, clock: Arc<dyn Clock>, config: &LifecycleConfig) -> Self {
        Self {
            repo,
            clock,
            allowed: config.permit_statuses.clone(),
            lock_key: config.lock_key,
        }
    }

    /// Run one pass as of the clock's current time.
    pub async fn run_pass(&self) -> Result<PassOutcome<TransitionReport>, PassError> {
        let now = self.clock.now();
        let outcome = self
            .repo
            .apply_transitions(now, &self.allowed, self.lock_key)
            .await
            .map_err(PassError::database("lifecycle"))?;

        match &outcome {
            PassOutcome::Ran(report) => info!(
                now = %now,
                scheduled_posted = report.scheduled_posted,
                approval_posted = report.approval_posted,
                expired = report.expired,
                deleted = report.deleted,
                temp_documents_removed = report.temp_documents_removed,
                "Lifecycle pass complete"
            ),
            PassOutcome::Skipped => {
                debug!(lock_key = self.lock_key, "Lifecycle pass skipped, lock held elsewhere")
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl PeriodicPass for LifecycleProcessor {
    fn name(&self) -> &'static str {
        "lifecycle"
    }

    async fn run_once(&self) -> Result<(), PassError> {
        self.run_pass().await.map(|_| ())
    }
}
