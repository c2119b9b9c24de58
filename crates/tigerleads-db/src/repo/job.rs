//! Job repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tigerleads_core::{Job, JobId, JobReviewStatus, UserId};

use crate::{DbError, DbResult};

/// Columns loaded into a [`JobRecord`], in table order.
const JOB_COLUMN_NAMES: [&str; 23] = [
    "id",
    "permit_number",
    "permit_status",
    "permit_type_norm",
    "project_description",
    "job_address",
    "project_cost_total",
    "property_type",
    "contractor_name",
    "contractor_email",
    "trs_score",
    "state",
    "source_county",
    "audience_type_slugs",
    "audience_type_names",
    "job_review_status",
    "review_posted_at",
    "anchor_at",
    "day_offset",
    "due_at",
    "uploaded_by_contractor",
    "uploaded_by_user_id",
    "created_at",
];

/// Attribute arrays. Imported rows can carry NULL elements, which are
/// dropped before decoding.
const ARRAY_COLUMNS: [&str; 3] = ["state", "source_county", "audience_type_slugs"];

/// Select list for a [`JobRecord`] over the `jobs` table aliased as `alias`.
pub(crate) fn job_columns(alias: &str) -> String {
    JOB_COLUMN_NAMES
        .iter()
        .map(|column| {
            if ARRAY_COLUMNS.contains(column) {
                format!("array_remove({alias}.{column}, NULL) AS {column}")
            } else {
                format!("{alias}.{column}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// A row of the `jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRecord {
    pub id: i64,
    pub permit_number: Option<String>,
    pub permit_status: Option<String>,
    pub permit_type_norm: Option<String>,
    pub project_description: Option<String>,
    pub job_address: Option<String>,
    pub project_cost_total: Option<i64>,
    pub property_type: Option<String>,
    pub contractor_name: Option<String>,
    pub contractor_email: Option<String>,
    pub trs_score: Option<i32>,
    pub state: Vec<String>,
    pub source_county: Vec<String>,
    pub audience_type_slugs: Vec<String>,
    pub audience_type_names: Option<String>,
    pub job_review_status: String,
    pub review_posted_at: Option<DateTime<Utc>>,
    pub anchor_at: Option<DateTime<Utc>>,
    pub day_offset: i32,
    pub due_at: Option<DateTime<Utc>>,
    pub uploaded_by_contractor: bool,
    pub uploaded_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<JobRecord> for Job {
    type Error = DbError;

    fn try_from(record: JobRecord) -> DbResult<Self> {
        let job_review_status = record
            .job_review_status
            .parse::<JobReviewStatus>()
            .map_err(|e| DbError::Corrupt(format!("job {}: {}", record.id, e)))?;

        Ok(Job {
            id: JobId::new(record.id),
            permit_number: record.permit_number,
            permit_status: record.permit_status,
            permit_type_norm: record.permit_type_norm,
            project_description: record.project_description,
            job_address: record.job_address,
            project_cost_total: record.project_cost_total,
            property_type: record.property_type,
            contractor_name: record.contractor_name,
            contractor_email: record.contractor_email,
            trs_score: record.trs_score,
            state: record.state,
            source_county: record.source_county,
            audience_type_slugs: record.audience_type_slugs,
            audience_type_names: record.audience_type_names,
            job_review_status,
            review_posted_at: record.review_posted_at,
            anchor_at: record.anchor_at,
            day_offset: record.day_offset,
            due_at: record.due_at,
            uploaded_by_contractor: record.uploaded_by_contractor,
            uploaded_by_user_id: record.uploaded_by_user_id.map(UserId::new),
            created_at: record.created_at,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one.
pub(crate) fn into_jobs(records: Vec<JobRecord>) -> DbResult<Vec<Job>> {
    records.into_iter().map(Job::try_from).collect()
}

#[async_trait]
pub trait JobRepo: Send + Sync {
    async fn get_by_id(&self, id: JobId) -> DbResult<Job>;
    /// Force a job into `status`. Posting stamps `review_posted_at` when unset.
    async fn set_review_status(&self, id: JobId, status: JobReviewStatus) -> DbResult<Job>;
    async fn delete(&self, id: JobId) -> DbResult<()>;
}

/// PostgreSQL implementation of JobRepo.
pub struct PgJobRepo {
    pool: PgPool,
}

impl PgJobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepo for PgJobRepo {
    async fn get_by_id(&self, id: JobId) -> DbResult<Job> {
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {} FROM jobs j WHERE j.id = $1",
            job_columns("j")
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("job {}", id)))?;
        record.try_into()
    }

    async fn set_review_status(&self, id: JobId, status: JobReviewStatus) -> DbResult<Job> {
        let record = sqlx::query_as::<_, JobRecord>(&format!(
            r#"
            UPDATE jobs AS j
            SET job_review_status = $2,
                review_posted_at = CASE
                    WHEN $2 = 'posted' THEN COALESCE(review_posted_at, NOW())
                    ELSE review_posted_at
                END,
                updated_at = NOW()
            WHERE j.id = $1
            RETURNING {}
            "#,
            job_columns("j")
        ))
        .bind(id.get())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("job {}", id)))?;
        record.try_into()
    }

    async fn delete(&self, id: JobId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("job {}", id)));
        }
        Ok(())
    }
}
