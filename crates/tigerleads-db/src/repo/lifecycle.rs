//! Lifecycle repository: the bulk status passes.
//!
//! Each pass runs in one transaction guarded by a transaction-scoped
//! advisory lock. A process that cannot take the lock skips the pass
//! instead of waiting for it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tigerleads_core::cap::{RetireAction, UnlockRow, UnlockTally};
use tigerleads_core::{
    CapReport, JobId, PassOutcome, PermitStatusAllowList, TransitionReport, UserId,
};

use crate::DbResult;

#[async_trait]
pub trait LifecycleRepo: Send + Sync {
    /// Post, expire and clean up jobs as of `now`.
    async fn apply_transitions(
        &self,
        now: DateTime<Utc>,
        allowed: &PermitStatusAllowList,
        lock_key: i64,
    ) -> DbResult<PassOutcome<TransitionReport>>;

    /// Retire jobs that `threshold` users of one trade have unlocked.
    async fn enforce_unlock_cap(
        &self,
        threshold: u32,
        lock_key: i64,
    ) -> DbResult<PassOutcome<CapReport>>;
}

#[derive(Debug, sqlx::FromRow)]
struct UnlockRecord {
    job_id: i64,
    user_id: i64,
    uploaded_by_contractor: bool,
    job_tokens: Vec<String>,
    user_trade_types: Vec<String>,
}

impl From<UnlockRecord> for UnlockRow {
    fn from(record: UnlockRecord) -> Self {
        UnlockRow {
            job_id: JobId::new(record.job_id),
            user_id: UserId::new(record.user_id),
            uploaded_by_contractor: record.uploaded_by_contractor,
            job_tokens: record.job_tokens,
            user_trade_types: record.user_trade_types,
        }
    }
}

/// PostgreSQL implementation of LifecycleRepo.
pub struct PgLifecycleRepo {
    pool: PgPool,
}

impl PgLifecycleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn try_lock(tx: &mut Transaction<'_, Postgres>, lock_key: i64) -> DbResult<bool> {
    let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
        .bind(lock_key)
        .fetch_one(&mut **tx)
        .await?;
    Ok(locked)
}

#[async_trait]
impl LifecycleRepo for PgLifecycleRepo {
    async fn apply_transitions(
        &self,
        now: DateTime<Utc>,
        allowed: &PermitStatusAllowList,
        lock_key: i64,
    ) -> DbResult<PassOutcome<TransitionReport>> {
        let mut tx = self.pool.begin().await?;
        if !try_lock(&mut tx, lock_key).await? {
            tx.rollback().await?;
            return Ok(PassOutcome::Skipped);
        }

        let scheduled_posted = sqlx::query(
            r#"
            UPDATE jobs
            SET job_review_status = 'posted', review_posted_at = $1, updated_at = $1
            WHERE job_review_status = 'pending'
              AND anchor_at IS NOT NULL
              AND due_at IS NOT NULL
              AND $1 >= anchor_at + make_interval(days => day_offset)
              AND $1 <= due_at
              AND permit_status = ANY($2)
            "#,
        )
        .bind(now)
        .bind(allowed.as_slice().to_vec())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let approval_posted = sqlx::query(
            r#"
            UPDATE jobs
            SET job_review_status = 'posted', updated_at = $1
            WHERE job_review_status = 'pending'
              AND uploaded_by_contractor = FALSE
              AND review_posted_at IS NOT NULL
              AND review_posted_at + make_interval(days => day_offset) <= $1
            "#,
        )
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let newly_expired: Vec<i64> = sqlx::query_scalar(
            r#"
            UPDATE jobs
            SET job_review_status = 'expired', updated_at = $1
            WHERE job_review_status IN ('pending', 'posted')
              AND due_at IS NOT NULL
              AND $1 > due_at
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        // Jobs expired by this pass stay visible as expired until the next one.
        let deleted = sqlx::query(
            "DELETE FROM jobs WHERE job_review_status = 'expired' AND NOT (id = ANY($1))",
        )
        .bind(&newly_expired)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let temp_documents_removed = sqlx::query(
            "DELETE FROM temp_documents WHERE linked_to_job = FALSE AND expires_at < $1",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(PassOutcome::Ran(TransitionReport {
            scheduled_posted,
            approval_posted,
            expired: newly_expired.len() as u64,
            deleted,
            temp_documents_removed,
        }))
    }

    async fn enforce_unlock_cap(
        &self,
        threshold: u32,
        lock_key: i64,
    ) -> DbResult<PassOutcome<CapReport>> {
        let mut tx = self.pool.begin().await?;
        if !try_lock(&mut tx, lock_key).await? {
            tx.rollback().await?;
            return Ok(PassOutcome::Skipped);
        }

        let rows = sqlx::query_as::<_, UnlockRecord>(
            r#"
            SELECT u.job_id,
                   u.user_id,
                   j.uploaded_by_contractor,
                   array_remove(j.audience_type_slugs, NULL) AS job_tokens,
                   array_remove(
                       COALESCE(c.user_type, s.user_type, ARRAY[]::TEXT[]), NULL
                   ) AS user_trade_types
            FROM unlocked_leads u
            JOIN jobs j ON j.id = u.job_id
            LEFT JOIN contractors c ON c.user_id = u.user_id
            LEFT JOIN suppliers s ON s.user_id = u.user_id
            WHERE j.job_review_status <> 'Complete'
            ORDER BY u.job_id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let tally = UnlockTally::from_rows(rows.into_iter().map(UnlockRow::from));
        let (mut to_delete, mut to_complete) = (Vec::new(), Vec::new());
        for retirement in tally.retirements(threshold) {
            match retirement.action {
                RetireAction::Delete => to_delete.push(retirement.job_id.get()),
                RetireAction::Complete => to_complete.push(retirement.job_id.get()),
            }
        }

        let mut report = CapReport::default();
        if !to_delete.is_empty() {
            report.deleted = sqlx::query("DELETE FROM jobs WHERE id = ANY($1)")
                .bind(&to_delete)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        if !to_complete.is_empty() {
            report.completed = sqlx::query(
                "UPDATE jobs SET job_review_status = 'Complete', updated_at = NOW() WHERE id = ANY($1)",
            )
            .bind(&to_complete)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(PassOutcome::Ran(report))
    }
}
