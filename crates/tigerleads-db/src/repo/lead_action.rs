//! Per-user lead actions: unlock, save, not interested.
//!
//! All three lists hide a job from its user's feed. Rows are keyed by the
//! effective account; callers resolve team members before calling in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tigerleads_core::{ExclusionSet, Job, JobId, UserId};

use crate::repo::job::{JobRecord, job_columns};
use crate::{DbError, DbResult};

/// One of the per-user job lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadList {
    Unlocked,
    Saved,
    NotInterested,
}

impl LeadList {
    pub const ALL: [LeadList; 3] = [LeadList::Unlocked, LeadList::Saved, LeadList::NotInterested];

    fn table(&self) -> &'static str {
        match self {
            LeadList::Unlocked => "unlocked_leads",
            LeadList::Saved => "saved_jobs",
            LeadList::NotInterested => "not_interested_jobs",
        }
    }
}

/// An unlocked job with when it was unlocked.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockedLead {
    pub job: Job,
    pub credits_spent: i32,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UnlockedRow {
    #[sqlx(flatten)]
    job: JobRecord,
    credits_spent: i32,
    unlocked_at: DateTime<Utc>,
}

#[async_trait]
pub trait LeadActionRepo: Send + Sync {
    /// Record an unlock. Returns `false` if the user had already unlocked it.
    async fn unlock(&self, user_id: UserId, job_id: JobId, credits: i32) -> DbResult<bool>;
    /// Add to a list. Returns `false` if already present.
    async fn add(&self, list: LeadList, user_id: UserId, job_id: JobId) -> DbResult<bool>;
    /// Remove from a list. Returns `false` if it was not there.
    async fn remove(&self, list: LeadList, user_id: UserId, job_id: JobId) -> DbResult<bool>;
    async fn job_ids(&self, list: LeadList, user_id: UserId) -> DbResult<Vec<JobId>>;
    async fn unlocked_jobs(&self, user_id: UserId) -> DbResult<Vec<UnlockedLead>>;

    /// Union of the three lists.
    async fn excluded_ids(&self, user_id: UserId) -> DbResult<ExclusionSet> {
        let mut excluded = ExclusionSet::new();
        for list in LeadList::ALL {
            excluded.extend(self.job_ids(list, user_id).await?);
        }
        Ok(excluded)
    }
}

/// PostgreSQL implementation of LeadActionRepo.
pub struct PgLeadActionRepo {
    pool: PgPool,
}

impl PgLeadActionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_job(&self, job_id: JobId) -> DbResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
            .bind(job_id.get())
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(DbError::NotFound(format!("job {}", job_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl LeadActionRepo for PgLeadActionRepo {
    async fn unlock(&self, user_id: UserId, job_id: JobId, credits: i32) -> DbResult<bool> {
        self.ensure_job(job_id).await?;
        let result = sqlx::query(
            r#"
            INSERT INTO unlocked_leads (user_id, job_id, credits_spent, unlocked_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, job_id) DO NOTHING
            "#,
        )
        .bind(user_id.get())
        .bind(job_id.get())
        .bind(credits)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn add(&self, list: LeadList, user_id: UserId, job_id: JobId) -> DbResult<bool> {
        if list == LeadList::Unlocked {
            return self.unlock(user_id, job_id, 1).await;
        }
        self.ensure_job(job_id).await?;
        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, job_id) VALUES ($1, $2) ON CONFLICT (user_id, job_id) DO NOTHING",
            list.table()
        ))
        .bind(user_id.get())
        .bind(job_id.get())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, list: LeadList, user_id: UserId, job_id: JobId) -> DbResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND job_id = $2",
            list.table()
        ))
        .bind(user_id.get())
        .bind(job_id.get())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn job_ids(&self, list: LeadList, user_id: UserId) -> DbResult<Vec<JobId>> {
        let ids: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT job_id FROM {} WHERE user_id = $1",
            list.table()
        ))
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(JobId::new).collect())
    }

    async fn unlocked_jobs(&self, user_id: UserId) -> DbResult<Vec<UnlockedLead>> {
        let columns = job_columns("j");
        let rows = sqlx::query_as::<_, UnlockedRow>(&format!(
            r#"
            SELECT {columns}, u.credits_spent, u.unlocked_at
            FROM unlocked_leads u
            JOIN jobs j ON j.id = u.job_id
            WHERE u.user_id = $1
            ORDER BY u.unlocked_at DESC, j.id DESC
            "#
        ))
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(UnlockedLead {
                    job: row.job.try_into()?,
                    credits_spent: row.credits_spent,
                    unlocked_at: row.unlocked_at,
                })
            })
            .collect()
    }
}
