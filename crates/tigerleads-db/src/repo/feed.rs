//! Feed query: posted jobs matching a user's criteria, newest first.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tigerleads_core::{ExclusionSet, Job, MatchCriteria};

use crate::DbResult;
use crate::repo::job::{JobRecord, into_jobs, job_columns};

/// Build the matching query.
///
/// Every user value is bound as an escaped `ILIKE` pattern; an array field
/// matches when any of its elements matches any pattern.
pub fn build_feed_query(
    criteria: &MatchCriteria,
    excluded: &ExclusionSet,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM jobs j WHERE j.job_review_status = 'posted'",
        job_columns("j")
    ));

    for (column, patterns) in [
        ("state", criteria.state_patterns()),
        ("source_county", criteria.county_patterns()),
        ("audience_type_slugs", criteria.trade_patterns()),
    ] {
        qb.push(format!(
            " AND EXISTS (SELECT 1 FROM unnest(j.{column}) AS v(val) WHERE v.val ILIKE ANY("
        ));
        qb.push_bind(patterns);
        qb.push("))");
    }

    if !excluded.is_empty() {
        qb.push(" AND NOT (j.id = ANY(");
        qb.push_bind(excluded.to_vec());
        qb.push("))");
    }

    qb.push(" ORDER BY j.review_posted_at DESC NULLS LAST, j.id DESC");
    qb
}

#[async_trait]
pub trait FeedRepo: Send + Sync {
    /// All matching jobs in feed order, before de-duplication.
    async fn matched_jobs(
        &self,
        criteria: &MatchCriteria,
        excluded: &ExclusionSet,
    ) -> DbResult<Vec<Job>>;
}

/// PostgreSQL implementation of FeedRepo.
pub struct PgFeedRepo {
    pool: PgPool,
}

impl PgFeedRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedRepo for PgFeedRepo {
    async fn matched_jobs(
        &self,
        criteria: &MatchCriteria,
        excluded: &ExclusionSet,
    ) -> DbResult<Vec<Job>> {
        let mut qb = build_feed_query(criteria, excluded);
        let records = qb
            .build_query_as::<JobRecord>()
            .fetch_all(&self.pool)
            .await?;
        into_jobs(records)
    }
}
