//! Lead matching criteria.
//!
//! A job is in a user's feed when, for each of state, county and trade type,
//! some job element contains some user value (case-insensitive substring),
//! the job is posted, and the user has not unlocked, saved or dismissed it.
//! An empty attribute list on the profile yields no matches at all.

use std::collections::HashSet;

use serde::Serialize;

use crate::job::{Job, JobReviewStatus};
use crate::profile::UserProfile;
use crate::JobId;

/// Normalised match attributes of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    states: Vec<String>,
    counties: Vec<String>,
    trade_types: Vec<String>,
}

impl MatchCriteria {
    /// Build criteria from a profile.
    ///
    /// Returns `None` when any of the three lists is empty after trimming,
    /// which callers treat as "nothing matches".
    pub fn from_profile(profile: &UserProfile) -> Option<Self> {
        let states = clean_values(&profile.states);
        let counties = clean_values(&profile.counties);
        let trade_types = split_trade_types(&profile.trade_types);

        if states.is_empty() || counties.is_empty() || trade_types.is_empty() {
            return None;
        }

        Some(Self {
            states,
            counties,
            trade_types,
        })
    }

    pub fn trade_types(&self) -> &[String] {
        &self.trade_types
    }

    /// `ILIKE` patterns for the state values.
    pub fn state_patterns(&self) -> Vec<String> {
        self.states.iter().map(|v| contains_pattern(v)).collect()
    }

    /// `ILIKE` patterns for the county values.
    pub fn county_patterns(&self) -> Vec<String> {
        self.counties.iter().map(|v| contains_pattern(v)).collect()
    }

    /// `ILIKE` patterns for the trade values.
    pub fn trade_patterns(&self) -> Vec<String> {
        self.trade_types.iter().map(|v| contains_pattern(v)).collect()
    }

    /// Per-field attribute match, ignoring review status and exclusions.
    pub fn explain(&self, job: &Job) -> MatchExplanation {
        MatchExplanation {
            state: any_contains(&job.state, &self.states),
            county: any_contains(&job.source_county, &self.counties),
            trade: any_contains(&job.audience_type_slugs, &self.trade_types),
            posted: job.job_review_status == JobReviewStatus::Posted,
        }
    }

    /// Whether the job belongs in this user's feed.
    pub fn matches(&self, job: &Job, excluded: &ExclusionSet) -> bool {
        self.explain(job).is_match() && !excluded.contains(job.id)
    }
}

/// Which parts of the visibility rule a job satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchExplanation {
    pub state: bool,
    pub county: bool,
    pub trade: bool,
    pub posted: bool,
}

impl MatchExplanation {
    pub fn is_match(&self) -> bool {
        self.state && self.county && self.trade && self.posted
    }
}

/// Job ids a user must not see: unlocked, saved, dismissed, plus any the
/// caller asks to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(HashSet<JobId>);

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I: IntoIterator<Item = JobId>>(&mut self, ids: I) {
        self.0.extend(ids);
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.0.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw ids, sorted, for binding as a Postgres array.
    pub fn to_vec(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.0.iter().map(|id| id.get()).collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<JobId> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = JobId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Collapse duplicate postings and cap the feed length.
///
/// `jobs` must already be in feed order; the first job of each duplicate
/// group is kept.
pub fn dedup_feed(jobs: Vec<Job>, limit: usize) -> Vec<Job> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| seen.insert(job.dedup_key()))
        .take(limit)
        .collect()
}

/// Case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn any_contains(field: &[String], values: &[String]) -> bool {
    field
        .iter()
        .any(|element| values.iter().any(|value| contains_ci(element, value)))
}

/// `%value%` with LIKE metacharacters escaped (default `\` escape).
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn clean_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn split_trade_types(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
