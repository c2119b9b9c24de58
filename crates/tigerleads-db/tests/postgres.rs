//! Repository queries against a real database.
//!
//! Each test gets a fresh database from `#[sqlx::test]` with the crate's
//! migrations applied; `DATABASE_URL` must point at a Postgres server.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::PgPool;
use tigerleads_core::{
    CapReport, JobId, JobReviewStatus, PassOutcome, PermitStatusAllowList, TransitionReport,
    UserId,
};
use tigerleads_db::{
    DbError, JobRepo, LeadActionRepo, LeadList, LeadMatcher, LifecycleRepo, PgFeedRepo,
    PgJobRepo, PgLeadActionRepo, PgLifecycleRepo, PgProfileRepo, ProfileRepo,
};

const LOCK_KEY: i64 = 7201;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

async fn insert_contractor(pool: &PgPool, user_id: i64, parent: Option<i64>, trades: &str) {
    sqlx::query(
        "INSERT INTO users (id, email, role, parent_user_id) VALUES ($1, $2, 'Contractor', $3)",
    )
    .bind(user_id)
    .bind(format!("user{user_id}@example.com"))
    .bind(parent)
    .execute(pool)
    .await
    .unwrap();
    if parent.is_some() {
        return;
    }
    sqlx::query(&format!(
        "INSERT INTO contractors (user_id, state, country_city, user_type) \
         VALUES ($1, '{{FL}}', '{{Hillsborough}}', '{trades}')"
    ))
    .bind(user_id)
    .execute(pool)
    .await
    .unwrap();
}

/// An FL / Hillsborough County job with the given status and slug literal.
async fn insert_job(pool: &PgPool, id: i64, status: &str, slugs: &str) {
    sqlx::query(&format!(
        "INSERT INTO jobs (id, permit_number, permit_status, contractor_name, state, \
         source_county, audience_type_slugs, job_review_status) \
         VALUES ($1, $2, 'Issued', $2, '{{FL}}', '{{Hillsborough County}}', '{slugs}', $3)"
    ))
    .bind(id)
    .bind(format!("BLD-{id}"))
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}

async fn schedule(
    pool: &PgPool,
    id: i64,
    anchor_at: Option<DateTime<Utc>>,
    day_offset: i32,
    due_at: Option<DateTime<Utc>>,
) {
    sqlx::query("UPDATE jobs SET anchor_at = $2, day_offset = $3, due_at = $4 WHERE id = $1")
        .bind(id)
        .bind(anchor_at)
        .bind(day_offset)
        .bind(due_at)
        .execute(pool)
        .await
        .unwrap();
}

async fn set_posted_at(pool: &PgPool, id: i64, at: DateTime<Utc>) {
    sqlx::query("UPDATE jobs SET review_posted_at = $2 WHERE id = $1")
        .bind(id)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
}

async fn status_of(pool: &PgPool, id: i64) -> Option<JobReviewStatus> {
    match PgJobRepo::new(pool.clone()).get_by_id(JobId::new(id)).await {
        Ok(job) => Some(job.job_review_status),
        Err(DbError::NotFound(_)) => None,
        Err(err) => panic!("unexpected error: {err}"),
    }
}

fn matcher(pool: &PgPool) -> LeadMatcher {
    LeadMatcher::new(
        Arc::new(PgProfileRepo::new(pool.clone())),
        Arc::new(PgLeadActionRepo::new(pool.clone())),
        Arc::new(PgFeedRepo::new(pool.clone())),
        Arc::new(PgJobRepo::new(pool.clone())),
    )
}

fn feed_ids(jobs: &[tigerleads_core::Job]) -> Vec<i64> {
    jobs.iter().map(|job| job.id.get()).collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn lifecycle_posts_expires_then_deletes_on_next_pass(pool: PgPool) {
    let now = now();
    insert_job(&pool, 1, "pending", "{Electrical Contractor}").await;
    schedule(&pool, 1, Some(now - Duration::days(3)), 2, Some(now + Duration::days(5))).await;
    insert_job(&pool, 2, "posted", "{Electrical Contractor}").await;
    schedule(&pool, 2, None, 0, Some(now - Duration::days(1))).await;
    insert_job(&pool, 3, "pending", "{Electrical Contractor}").await;
    schedule(&pool, 3, Some(now - Duration::days(3)), 2, Some(now + Duration::days(5))).await;
    sqlx::query("UPDATE jobs SET permit_status = 'Withdrawn' WHERE id = 3")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO temp_documents (temp_upload_id, linked_to_job, expires_at) \
         VALUES ('stale', FALSE, $1), ('linked', TRUE, $1), ('fresh', FALSE, $2)",
    )
    .bind(now - Duration::hours(1))
    .bind(now + Duration::hours(1))
    .execute(&pool)
    .await
    .unwrap();

    let repo = PgLifecycleRepo::new(pool.clone());
    let allowed = PermitStatusAllowList::default();

    let first = repo.apply_transitions(now, &allowed, LOCK_KEY).await.unwrap();
    assert_eq!(
        first,
        PassOutcome::Ran(TransitionReport {
            scheduled_posted: 1,
            approval_posted: 0,
            expired: 1,
            deleted: 0,
            temp_documents_removed: 1,
        })
    );
    let posted = PgJobRepo::new(pool.clone()).get_by_id(JobId::new(1)).await.unwrap();
    assert_eq!(posted.job_review_status, JobReviewStatus::Posted);
    assert_eq!(posted.review_posted_at, Some(now));
    assert_eq!(status_of(&pool, 2).await, Some(JobReviewStatus::Expired));
    assert_eq!(status_of(&pool, 3).await, Some(JobReviewStatus::Pending));

    let second = repo.apply_transitions(now, &allowed, LOCK_KEY).await.unwrap();
    let PassOutcome::Ran(report) = second else {
        panic!("second pass skipped");
    };
    assert_eq!(report.transitions(), 0);
    assert_eq!(report.deleted, 1);
    assert_eq!(status_of(&pool, 2).await, None);
    assert_eq!(status_of(&pool, 1).await, Some(JobReviewStatus::Posted));
}

#[sqlx::test(migrations = "./migrations")]
async fn lifecycle_posts_approved_jobs_after_their_delay(pool: PgPool) {
    let now = now();
    insert_job(&pool, 1, "pending", "{Roofing Contractor}").await;
    schedule(&pool, 1, None, 2, None).await;
    set_posted_at(&pool, 1, now - Duration::days(3)).await;
    insert_job(&pool, 2, "pending", "{Roofing Contractor}").await;
    schedule(&pool, 2, None, 5, None).await;
    set_posted_at(&pool, 2, now - Duration::days(3)).await;

    let repo = PgLifecycleRepo::new(pool.clone());
    let outcome = repo
        .apply_transitions(now, &PermitStatusAllowList::default(), LOCK_KEY)
        .await
        .unwrap();
    let PassOutcome::Ran(report) = outcome else {
        panic!("pass skipped");
    };
    assert_eq!(report.approval_posted, 1);

    let job = PgJobRepo::new(pool.clone()).get_by_id(JobId::new(1)).await.unwrap();
    assert_eq!(job.job_review_status, JobReviewStatus::Posted);
    assert_eq!(job.review_posted_at, Some(now - Duration::days(3)));
    assert_eq!(status_of(&pool, 2).await, Some(JobReviewStatus::Pending));
}

#[sqlx::test(migrations = "./migrations")]
async fn lifecycle_skips_while_another_session_holds_the_lock(pool: PgPool) {
    let now = now();
    insert_job(&pool, 1, "pending", "{Electrical Contractor}").await;
    schedule(&pool, 1, None, 0, Some(now - Duration::days(1))).await;

    let mut holder = pool.acquire().await.unwrap();
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(LOCK_KEY)
        .execute(&mut *holder)
        .await
        .unwrap();

    let repo = PgLifecycleRepo::new(pool.clone());
    let allowed = PermitStatusAllowList::default();
    let outcome = repo.apply_transitions(now, &allowed, LOCK_KEY).await.unwrap();
    assert_eq!(outcome, PassOutcome::Skipped);
    assert_eq!(status_of(&pool, 1).await, Some(JobReviewStatus::Pending));

    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(LOCK_KEY)
        .execute(&mut *holder)
        .await
        .unwrap();
    let outcome = repo.apply_transitions(now, &allowed, LOCK_KEY).await.unwrap();
    assert!(matches!(outcome, PassOutcome::Ran(report) if report.expired == 1));
}

#[sqlx::test(migrations = "./migrations")]
async fn unlock_cap_deletes_or_completes_despite_null_elements(pool: PgPool) {
    insert_job(&pool, 10, "posted", "{Electrical Contractor,NULL}").await;
    insert_job(&pool, 11, "posted", "{Electrical Contractor}").await;
    sqlx::query("UPDATE jobs SET uploaded_by_contractor = TRUE WHERE id = 11")
        .execute(&pool)
        .await
        .unwrap();
    insert_job(&pool, 12, "posted", "{Electrical Contractor}").await;

    let actions = PgLeadActionRepo::new(pool.clone());
    for user in 101..=105 {
        let trades = if user == 105 { "{Electrical,NULL}" } else { "{Electrical}" };
        insert_contractor(&pool, user, None, trades).await;
        for job in [10, 11] {
            assert!(actions.unlock(UserId::new(user), JobId::new(job), 1).await.unwrap());
        }
        if user < 105 {
            actions.unlock(UserId::new(user), JobId::new(12), 1).await.unwrap();
        }
    }

    let repo = PgLifecycleRepo::new(pool.clone());
    let outcome = repo.enforce_unlock_cap(5, 7202).await.unwrap();
    assert_eq!(
        outcome,
        PassOutcome::Ran(CapReport {
            deleted: 1,
            completed: 1
        })
    );
    assert_eq!(status_of(&pool, 10).await, None);
    assert_eq!(status_of(&pool, 11).await, Some(JobReviewStatus::Complete));
    assert_eq!(status_of(&pool, 12).await, Some(JobReviewStatus::Posted));

    let again = repo.enforce_unlock_cap(5, 7202).await.unwrap();
    assert_eq!(again, PassOutcome::Ran(CapReport::default()));
}

#[sqlx::test(migrations = "./migrations")]
async fn feed_matches_hillsborough_electrical_and_honours_every_list(pool: PgPool) {
    let now = now();
    insert_contractor(&pool, 1, None, "{Electrical,NULL}").await;
    insert_contractor(&pool, 2, Some(1), "").await;

    insert_job(&pool, 1, "posted", "{Electrical Contractor}").await;
    set_posted_at(&pool, 1, now - Duration::hours(3)).await;
    insert_job(&pool, 2, "posted", "{Electrical Contractor,NULL}").await;
    set_posted_at(&pool, 2, now - Duration::hours(2)).await;
    insert_job(&pool, 3, "posted", "{Plumbing Contractor}").await;
    set_posted_at(&pool, 3, now - Duration::hours(1)).await;
    insert_job(&pool, 4, "pending", "{Electrical Contractor}").await;
    insert_job(&pool, 5, "posted", "{Electrical Contractor}").await;
    set_posted_at(&pool, 5, now - Duration::hours(4)).await;
    sqlx::query("UPDATE jobs SET state = '{GA}' WHERE id = 5")
        .execute(&pool)
        .await
        .unwrap();

    let profile = PgProfileRepo::new(pool.clone())
        .get_profile(UserId::new(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.user_id, UserId::new(1));
    assert_eq!(profile.trade_types, vec!["Electrical"]);

    let matcher = matcher(&pool);
    let feed = matcher.feed(UserId::new(2), &[], 20).await.unwrap();
    assert_eq!(feed.user_id, UserId::new(1));
    assert_eq!(feed_ids(&feed.jobs), vec![2, 1]);
    assert_eq!(feed.jobs[0].audience_type_slugs, vec!["Electrical Contractor"]);

    let feed = matcher.feed(UserId::new(1), &[JobId::new(2)], 20).await.unwrap();
    assert_eq!(feed_ids(&feed.jobs), vec![1]);

    let actions = PgLeadActionRepo::new(pool.clone());
    assert!(actions.add(LeadList::Saved, UserId::new(1), JobId::new(2)).await.unwrap());
    let feed = matcher.feed(UserId::new(1), &[], 20).await.unwrap();
    assert_eq!(feed_ids(&feed.jobs), vec![1]);

    assert!(
        actions
            .add(LeadList::NotInterested, UserId::new(1), JobId::new(1))
            .await
            .unwrap()
    );
    let feed = matcher.feed(UserId::new(2), &[], 20).await.unwrap();
    assert!(feed.jobs.is_empty());

    let explanation = matcher.explain(UserId::new(1), JobId::new(1)).await.unwrap();
    assert!(explanation.excluded);
    assert!(explanation.fields.unwrap().is_match());
    assert!(!explanation.visible);
}

#[sqlx::test(migrations = "./migrations")]
async fn unlocked_jobs_join_survives_null_elements(pool: PgPool) {
    insert_contractor(&pool, 1, None, "{Electrical}").await;
    insert_job(&pool, 7, "posted", "{NULL,Electrical Contractor}").await;

    let actions = PgLeadActionRepo::new(pool.clone());
    assert!(actions.unlock(UserId::new(1), JobId::new(7), 3).await.unwrap());
    assert!(!actions.unlock(UserId::new(1), JobId::new(7), 3).await.unwrap());

    let unlocked = actions.unlocked_jobs(UserId::new(1)).await.unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].credits_spent, 3);
    assert_eq!(unlocked[0].job.audience_type_slugs, vec!["Electrical Contractor"]);

    let missing = actions.unlock(UserId::new(1), JobId::new(99), 1).await;
    assert!(matches!(missing, Err(DbError::NotFound(_))));
}
