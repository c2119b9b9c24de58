//! In-memory stand-in for the lifecycle repository.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tigerleads_core::cap::{RetireAction, UnlockRow, UnlockTally};
use tigerleads_core::{
    CapReport, Job, JobId, JobReviewStatus, PassOutcome, PermitStatusAllowList, TransitionReport,
    UserId,
};
use tigerleads_db::{DbError, DbResult, LifecycleRepo};

pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
}

/// Pending FL electrical job: postable from March 3, due March 20.
pub(crate) fn pending_job(id: i64) -> Job {
    Job {
        id: JobId::new(id),
        permit_number: Some(format!("P-{id}")),
        permit_status: Some("Issued".to_string()),
        permit_type_norm: Some("Electrical".to_string()),
        project_description: Some("Panel upgrade".to_string()),
        job_address: None,
        project_cost_total: None,
        property_type: None,
        contractor_name: None,
        contractor_email: None,
        trs_score: None,
        state: vec!["FL".to_string()],
        source_county: vec!["Hillsborough County".to_string()],
        audience_type_slugs: vec!["Electrical Contractor".to_string()],
        audience_type_names: None,
        job_review_status: JobReviewStatus::Pending,
        review_posted_at: None,
        anchor_at: Some(at(1, 0)),
        day_offset: 2,
        due_at: Some(at(20, 0)),
        uploaded_by_contractor: false,
        uploaded_by_user_id: None,
        created_at: at(1, 0),
    }
}

#[derive(Default)]
struct State {
    jobs: BTreeMap<JobId, Job>,
    unlocks: Vec<(JobId, UserId, Vec<String>)>,
    held_locks: HashSet<i64>,
    fail_next: bool,
}

#[derive(Default)]
pub(crate) struct MemoryLifecycleRepo {
    state: Mutex<State>,
}

impl MemoryLifecycleRepo {
    pub(crate) fn insert(&self, job: Job) {
        self.state.lock().unwrap().jobs.insert(job.id, job);
    }

    pub(crate) fn job(&self, id: i64) -> Option<Job> {
        self.state.lock().unwrap().jobs.get(&JobId::new(id)).cloned()
    }

    pub(crate) fn unlock(&self, job: i64, user: i64, trades: &[&str]) {
        self.state.lock().unwrap().unlocks.push((
            JobId::new(job),
            UserId::new(user),
            trades.iter().map(|t| t.to_string()).collect(),
        ));
    }

    pub(crate) fn hold_lock(&self, key: i64) {
        self.state.lock().unwrap().held_locks.insert(key);
    }

    pub(crate) fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }
}

impl State {
    fn guard(&mut self, lock_key: i64) -> DbResult<bool> {
        if std::mem::take(&mut self.fail_next) {
            return Err(DbError::NotFound("injected failure".to_string()));
        }
        Ok(!self.held_locks.contains(&lock_key))
    }
}

#[async_trait]
impl LifecycleRepo for MemoryLifecycleRepo {
    async fn apply_transitions(
        &self,
        now: DateTime<Utc>,
        allowed: &PermitStatusAllowList,
        lock_key: i64,
    ) -> DbResult<PassOutcome<TransitionReport>> {
        let mut state = self.state.lock().unwrap();
        if !state.guard(lock_key)? {
            return Ok(PassOutcome::Skipped);
        }

        let mut report = TransitionReport::default();
        for job in state.jobs.values_mut() {
            if job.is_ready_to_post(now, allowed) {
                job.job_review_status = JobReviewStatus::Posted;
                job.review_posted_at = Some(now);
                report.scheduled_posted += 1;
            }
        }
        for job in state.jobs.values_mut() {
            if job.is_approval_delay_over(now) {
                job.job_review_status = JobReviewStatus::Posted;
                report.approval_posted += 1;
            }
        }
        let mut newly_expired = HashSet::new();
        for job in state.jobs.values_mut() {
            if job.is_overdue(now) {
                job.job_review_status = JobReviewStatus::Expired;
                newly_expired.insert(job.id);
            }
        }
        report.expired = newly_expired.len() as u64;

        let before = state.jobs.len();
        state.jobs.retain(|id, job| {
            job.job_review_status != JobReviewStatus::Expired || newly_expired.contains(id)
        });
        report.deleted = (before - state.jobs.len()) as u64;

        Ok(PassOutcome::Ran(report))
    }

    async fn enforce_unlock_cap(
        &self,
        threshold: u32,
        lock_key: i64,
    ) -> DbResult<PassOutcome<CapReport>> {
        let mut state = self.state.lock().unwrap();
        if !state.guard(lock_key)? {
            return Ok(PassOutcome::Skipped);
        }

        let rows: Vec<UnlockRow> = state
            .unlocks
            .iter()
            .filter_map(|(job_id, user_id, trades)| {
                let job = state.jobs.get(job_id)?;
                (job.job_review_status != JobReviewStatus::Complete).then(|| UnlockRow {
                    job_id: *job_id,
                    user_id: *user_id,
                    uploaded_by_contractor: job.uploaded_by_contractor,
                    job_tokens: job.audience_type_slugs.clone(),
                    user_trade_types: trades.clone(),
                })
            })
            .collect();

        let mut report = CapReport::default();
        for retirement in UnlockTally::from_rows(rows).retirements(threshold) {
            match retirement.action {
                RetireAction::Delete => {
                    state.jobs.remove(&retirement.job_id);
                    report.deleted += 1;
                }
                RetireAction::Complete => {
                    if let Some(job) = state.jobs.get_mut(&retirement.job_id) {
                        job.job_review_status = JobReviewStatus::Complete;
                        report.completed += 1;
                    }
                }
            }
        }
        Ok(PassOutcome::Ran(report))
    }
}
