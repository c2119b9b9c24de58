//! Job (lead) definitions and the per-job lifecycle predicates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::PermitStatusAllowList;
use crate::{Error, JobId, UserId};

/// Review status of a job.
///
/// The stored spelling is kept as-is: `Complete` is capitalised in the
/// database while the other three are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobReviewStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "posted")]
    Posted,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "Complete")]
    Complete,
}

impl JobReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobReviewStatus::Pending => "pending",
            JobReviewStatus::Posted => "posted",
            JobReviewStatus::Expired => "expired",
            JobReviewStatus::Complete => "Complete",
        }
    }

    /// Whether the expiry rule applies to jobs in this state.
    pub fn can_expire(&self) -> bool {
        matches!(self, JobReviewStatus::Pending | JobReviewStatus::Posted)
    }
}

impl std::fmt::Display for JobReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobReviewStatus::Pending),
            "posted" => Ok(JobReviewStatus::Posted),
            "expired" => Ok(JobReviewStatus::Expired),
            "Complete" | "complete" => Ok(JobReviewStatus::Complete),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

/// A permit-derived lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub permit_number: Option<String>,
    /// Status reported by the permitting authority ("Issued", "In Review", ...).
    pub permit_status: Option<String>,
    pub permit_type_norm: Option<String>,
    pub project_description: Option<String>,
    pub job_address: Option<String>,
    pub project_cost_total: Option<i64>,
    pub property_type: Option<String>,
    pub contractor_name: Option<String>,
    pub contractor_email: Option<String>,
    pub trs_score: Option<i32>,
    /// Region codes the job is in.
    pub state: Vec<String>,
    /// County names the permit was sourced from.
    pub source_county: Vec<String>,
    /// Trade-type tokens the lead is relevant to.
    pub audience_type_slugs: Vec<String>,
    /// Human-readable counterpart of `audience_type_slugs`.
    pub audience_type_names: Option<String>,
    pub job_review_status: JobReviewStatus,
    pub review_posted_at: Option<DateTime<Utc>>,
    pub anchor_at: Option<DateTime<Utc>>,
    /// Days after `anchor_at` (or after approval) before the job may post.
    pub day_offset: i32,
    pub due_at: Option<DateTime<Utc>>,
    pub uploaded_by_contractor: bool,
    pub uploaded_by_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    fn offset(&self) -> Duration {
        Duration::days(i64::from(self.day_offset))
    }

    /// Scheduled posting: the anchor plus offset has passed, the job is not
    /// yet due, and the permit is in an allowed status.
    pub fn is_ready_to_post(&self, now: DateTime<Utc>, allowed: &PermitStatusAllowList) -> bool {
        if self.job_review_status != JobReviewStatus::Pending {
            return false;
        }
        let (Some(anchor_at), Some(due_at)) = (self.anchor_at, self.due_at) else {
            return false;
        };
        let permit_ok = self
            .permit_status
            .as_deref()
            .is_some_and(|status| allowed.contains(status));

        permit_ok && now >= anchor_at + self.offset() && now <= due_at
    }

    /// Approval delay: an admin-approved job posts once its approval time
    /// plus offset has passed.
    pub fn is_approval_delay_over(&self, now: DateTime<Utc>) -> bool {
        if self.job_review_status != JobReviewStatus::Pending || self.uploaded_by_contractor {
            return false;
        }
        self.review_posted_at
            .is_some_and(|approved_at| approved_at + self.offset() <= now)
    }

    /// Whether the job is past its due date and still in an expirable state.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.job_review_status.can_expire() && self.due_at.is_some_and(|due_at| now > due_at)
    }

    /// Key used to collapse duplicate postings of the same work in a feed.
    pub fn dedup_key(&self) -> DedupKey {
        fn norm(value: &Option<String>) -> String {
            value.as_deref().unwrap_or_default().trim().to_lowercase()
        }

        let description: String = norm(&self.project_description)
            .chars()
            .take(DESCRIPTION_KEY_CHARS)
            .collect();

        DedupKey {
            permit_type: norm(&self.permit_type_norm),
            description,
            contractor_name: norm(&self.contractor_name),
            contractor_email: norm(&self.contractor_email),
        }
    }
}

/// Leading characters of the description that take part in de-duplication.
const DESCRIPTION_KEY_CHARS: usize = 200;

/// Normalised identity of a posting for feed de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    permit_type: String,
    description: String,
    contractor_name: String,
    contractor_email: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    pub(crate) fn make_job(id: i64) -> Job {
        Job {
            id: JobId::new(id),
            permit_number: Some(format!("P-{id}")),
            permit_status: Some("Issued".to_string()),
            permit_type_norm: Some("Electrical".to_string()),
            project_description: Some("Panel upgrade".to_string()),
            job_address: None,
            project_cost_total: Some(12_000),
            property_type: Some("Residential".to_string()),
            contractor_name: Some("Acme".to_string()),
            contractor_email: Some("acme@example.com".to_string()),
            trs_score: Some(70),
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

    #[test]
    fn test_status_round_trip_spelling() {
        assert_eq!("Complete".parse::<JobReviewStatus>().unwrap(), JobReviewStatus::Complete);
        assert_eq!(JobReviewStatus::Complete.as_str(), "Complete");
        assert_eq!(JobReviewStatus::Posted.to_string(), "posted");
        assert!("scheduled".parse::<JobReviewStatus>().is_err());
    }

    #[test]
    fn test_ready_to_post_window() {
        let allowed = PermitStatusAllowList::default();
        let job = make_job(1);

        // anchor is the 1st, offset two days
        assert!(!job.is_ready_to_post(at(2, 23), &allowed));
        assert!(job.is_ready_to_post(at(3, 0), &allowed));
        assert!(job.is_ready_to_post(at(20, 0), &allowed));
        assert!(!job.is_ready_to_post(at(20, 1), &allowed));
    }

    #[test]
    fn test_ready_to_post_requires_allowed_permit_status() {
        let allowed = PermitStatusAllowList::default();
        let mut job = make_job(1);
        job.permit_status = Some("Withdrawn".to_string());
        assert!(!job.is_ready_to_post(at(5, 0), &allowed));

        job.permit_status = None;
        assert!(!job.is_ready_to_post(at(5, 0), &allowed));
    }

    #[test]
    fn test_ready_to_post_requires_anchor_and_due() {
        let allowed = PermitStatusAllowList::default();
        let mut job = make_job(1);
        job.anchor_at = None;
        assert!(!job.is_ready_to_post(at(5, 0), &allowed));

        let mut job = make_job(2);
        job.due_at = None;
        assert!(!job.is_ready_to_post(at(5, 0), &allowed));
    }

    #[test]
    fn test_approval_delay() {
        let mut job = make_job(1);
        job.anchor_at = None;
        job.review_posted_at = Some(at(10, 0));
        job.day_offset = 1;

        assert!(!job.is_approval_delay_over(at(10, 23)));
        assert!(job.is_approval_delay_over(at(11, 0)));

        job.uploaded_by_contractor = true;
        assert!(!job.is_approval_delay_over(at(11, 0)));
    }

    #[test]
    fn test_overdue() {
        let mut job = make_job(1);
        assert!(!job.is_overdue(at(20, 0)));
        assert!(job.is_overdue(at(20, 1)));

        job.job_review_status = JobReviewStatus::Complete;
        assert!(!job.is_overdue(at(25, 0)));

        job.job_review_status = JobReviewStatus::Posted;
        job.due_at = None;
        assert!(!job.is_overdue(at(25, 0)));
    }

    #[test]
    fn test_dedup_key_normalises_fields() {
        let a = make_job(1);
        let mut b = make_job(2);
        b.contractor_name = Some("  ACME ".to_string());
        b.project_description = Some("PANEL UPGRADE".to_string());
        assert_eq!(a.dedup_key(), b.dedup_key());

        b.contractor_email = Some("other@example.com".to_string());
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_truncates_description() {
        let mut a = make_job(1);
        let mut b = make_job(2);
        let prefix = "x".repeat(DESCRIPTION_KEY_CHARS);
        a.project_description = Some(format!("{prefix} first tail"));
        b.project_description = Some(format!("{prefix} second tail"));
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
