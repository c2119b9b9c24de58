//! Feed inspection.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tigerleads_core::{Job, JobId, UserId};
use tigerleads_db::{LeadMatcher, PgFeedRepo, PgJobRepo, PgLeadActionRepo, PgProfileRepo};

use super::{connect, load_config};

async fn matcher(config_path: Option<&Path>) -> Result<(LeadMatcher, tigerleads_config::SystemConfig)> {
    let config = load_config(config_path)?;
    let pool = connect(&config).await?;
    let matcher = LeadMatcher::new(
        Arc::new(PgProfileRepo::new(pool.clone())),
        Arc::new(PgLeadActionRepo::new(pool.clone())),
        Arc::new(PgFeedRepo::new(pool.clone())),
        Arc::new(PgJobRepo::new(pool)),
    );
    Ok((matcher, config))
}

fn summary(job: &Job) -> String {
    let posted = job
        .review_posted_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>8}  {}  {:<20}  {}  {}",
        job.id,
        posted,
        job.permit_type_norm.as_deref().unwrap_or("-"),
        job.source_county.join("/"),
        job.audience_type_slugs.join(", "),
    )
}

pub async fn feed(
    config_path: Option<&Path>,
    user_id: i64,
    limit: Option<usize>,
    exclude: Vec<i64>,
) -> Result<()> {
    let (matcher, config) = matcher(config_path).await?;
    let exclude: Vec<JobId> = exclude.into_iter().map(JobId::new).collect();
    let limit = config.feed.effective_limit(limit);

    let feed = matcher.feed(UserId::new(user_id), &exclude, limit).await?;
    if feed.user_id.get() != user_id {
        println!("Team member of user {}", feed.user_id);
    }
    if !feed.profile_complete {
        println!("Profile incomplete: no state, county or trade type set");
        return Ok(());
    }

    println!("{} of {} matching jobs", feed.jobs.len(), feed.matched);
    for job in &feed.jobs {
        println!("{}", summary(job));
    }
    Ok(())
}

pub async fn explain(config_path: Option<&Path>, user_id: i64, job_id: i64) -> Result<()> {
    let (matcher, _) = matcher(config_path).await?;
    let explanation = matcher
        .explain(UserId::new(user_id), JobId::new(job_id))
        .await?;
    println!("{}", serde_json::to_string_pretty(&explanation)?);
    Ok(())
}
