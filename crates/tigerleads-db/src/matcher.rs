//! Lead matching over the repositories.
//!
//! Resolves the effective account, loads its profile and exclusions, runs
//! the feed query and collapses duplicate postings.

use std::sync::Arc;

use serde::Serialize;
use tigerleads_core::matching::dedup_feed;
use tigerleads_core::{ExclusionSet, Job, JobId, MatchCriteria, MatchExplanation, UserId};

use crate::DbResult;
use crate::repo::{FeedRepo, JobRepo, LeadActionRepo, ProfileRepo};

/// A computed feed.
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    /// Account the feed was computed for (the parent for team members).
    pub user_id: UserId,
    /// False when the profile is missing or has an empty attribute list.
    pub profile_complete: bool,
    /// Matching rows before de-duplication and the limit.
    pub matched: usize,
    pub jobs: Vec<Job>,
}

/// Why a job is or is not in a user's feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedExplanation {
    pub user_id: UserId,
    pub job_id: JobId,
    pub profile_complete: bool,
    /// Per-field result; absent when the profile is incomplete.
    pub fields: Option<MatchExplanation>,
    pub excluded: bool,
    pub visible: bool,
}

#[derive(Clone)]
pub struct LeadMatcher {
    profiles: Arc<dyn ProfileRepo>,
    actions: Arc<dyn LeadActionRepo>,
    feed: Arc<dyn FeedRepo>,
    jobs: Arc<dyn JobRepo>,
}

impl LeadMatcher {
    pub fn new(
        profiles: Arc<dyn ProfileRepo>,
        actions: Arc<dyn LeadActionRepo>,
        feed: Arc<dyn FeedRepo>,
        jobs: Arc<dyn JobRepo>,
    ) -> Self {
        Self {
            profiles,
            actions,
            feed,
            jobs,
        }
    }

    /// Criteria for the effective account of `user_id`, if complete.
    async fn criteria(&self, user_id: UserId) -> DbResult<(UserId, Option<MatchCriteria>)> {
        let effective = self.profiles.effective_user(user_id).await?;
        let criteria = self
            .profiles
            .get_profile(effective)
            .await?
            .as_ref()
            .and_then(MatchCriteria::from_profile);
        Ok((effective, criteria))
    }

    /// The user's feed, at most `limit` jobs long.
    ///
    /// `extra_exclude` hides additional jobs on top of the stored lists.
    pub async fn feed(
        &self,
        user_id: UserId,
        extra_exclude: &[JobId],
        limit: usize,
    ) -> DbResult<Feed> {
        let (effective, criteria) = self.criteria(user_id).await?;
        let Some(criteria) = criteria else {
            return Ok(Feed {
                user_id: effective,
                profile_complete: false,
                matched: 0,
                jobs: Vec::new(),
            });
        };

        let mut excluded = self.actions.excluded_ids(effective).await?;
        excluded.extend(extra_exclude.iter().copied());

        let rows = self.feed.matched_jobs(&criteria, &excluded).await?;
        let matched = rows.len();
        Ok(Feed {
            user_id: effective,
            profile_complete: true,
            matched,
            jobs: dedup_feed(rows, limit),
        })
    }

    /// Evaluate the visibility rule for one job, field by field.
    pub async fn explain(&self, user_id: UserId, job_id: JobId) -> DbResult<FeedExplanation> {
        let job = self.jobs.get_by_id(job_id).await?;
        let (effective, criteria) = self.criteria(user_id).await?;
        let excluded: ExclusionSet = self.actions.excluded_ids(effective).await?;
        let is_excluded = excluded.contains(job_id);
        let fields = criteria.as_ref().map(|c| c.explain(&job));

        Ok(FeedExplanation {
            user_id: effective,
            job_id,
            profile_complete: criteria.is_some(),
            fields,
            excluded: is_excluded,
            visible: fields.is_some_and(|f| f.is_match()) && !is_excluded,
        })
    }
}
