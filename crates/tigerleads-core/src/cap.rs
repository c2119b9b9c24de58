//! Unlock cap: retire a lead once enough users of one trade have unlocked it.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::matching::{contains_ci, split_trade_types};
use crate::{JobId, UserId};

/// One unlock together with what is needed to attribute it to trade tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockRow {
    pub job_id: JobId,
    pub user_id: UserId,
    pub uploaded_by_contractor: bool,
    /// The job's `audience_type_slugs`.
    pub job_tokens: Vec<String>,
    /// The unlocking user's `user_type` list, possibly comma-joined.
    pub user_trade_types: Vec<String>,
}

/// What happens to a job that reached the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetireAction {
    /// Ingested lead: removed outright.
    Delete,
    /// Contractor-uploaded lead: kept for its owner, marked `Complete`.
    Complete,
}

/// A job that reached the cap under one of its tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retirement {
    pub job_id: JobId,
    pub action: RetireAction,
    pub token: String,
    pub distinct_users: usize,
}

#[derive(Debug, Default)]
struct JobTally {
    uploaded_by_contractor: bool,
    /// Lowercased token → (first-seen spelling, distinct unlocking users).
    tokens: BTreeMap<String, (String, HashSet<UserId>)>,
}

/// Distinct unlocking users per `(job, token)`.
#[derive(Debug, Default)]
pub struct UnlockTally {
    jobs: BTreeMap<JobId, JobTally>,
}

impl UnlockTally {
    pub fn from_rows<I: IntoIterator<Item = UnlockRow>>(rows: I) -> Self {
        let mut tally = Self::default();
        for row in rows {
            tally.record(row);
        }
        tally
    }

    /// Count the unlock under every job token the user's trades match.
    pub fn record(&mut self, row: UnlockRow) {
        let trades = split_trade_types(&row.user_trade_types);
        let job = self.jobs.entry(row.job_id).or_default();
        job.uploaded_by_contractor = row.uploaded_by_contractor;

        for token in row.job_tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !trades.iter().any(|trade| contains_ci(token, trade)) {
                continue;
            }
            job.tokens
                .entry(token.to_lowercase())
                .or_insert_with(|| (token.to_string(), HashSet::new()))
                .1
                .insert(row.user_id);
        }
    }

    /// Jobs where some token reached `threshold` distinct users, in job id
    /// order. Each job is reported once, under its most-unlocked token.
    pub fn retirements(&self, threshold: u32) -> Vec<Retirement> {
        let threshold = threshold.max(1) as usize;
        self.jobs
            .iter()
            .filter_map(|(job_id, job)| {
                let (token, users) = job
                    .tokens
                    .values()
                    .max_by_key(|(_, users)| users.len())?;
                if users.len() < threshold {
                    return None;
                }
                Some(Retirement {
                    job_id: *job_id,
                    action: if job.uploaded_by_contractor {
                        RetireAction::Complete
                    } else {
                        RetireAction::Delete
                    },
                    token: token.clone(),
                    distinct_users: users.len(),
                })
            })
            .collect()
    }
}
