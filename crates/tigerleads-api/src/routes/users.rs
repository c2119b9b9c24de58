//! Per-user endpoints: the matched feed and lead actions.
//!
//! Team members act on their parent account's lists.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tigerleads_core::{JobId, UserId};
use tigerleads_db::{Feed, LeadActionRepo, LeadList, ProfileRepo, UnlockedLead};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{user_id}/matched-jobs", get(matched_jobs))
        .route("/{user_id}/unlocked-jobs", get(unlocked_jobs))
        .route("/{user_id}/unlocks/{job_id}", post(unlock))
        .route("/{user_id}/saved-jobs/{job_id}", post(save).delete(unsave))
        .route("/{user_id}/not-interested/{job_id}", post(not_interested))
}

fn rate_limit(state: &AppState, user_id: UserId) -> Result<(), ApiError> {
    state
        .rate_limiter
        .check(user_id)
        .map_err(|retry_after| ApiError::TooManyRequests { retry_after })
}

/// Parse a comma-separated id list, ignoring blanks.
fn parse_exclude(raw: Option<&str>) -> Result<Vec<JobId>, ApiError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<JobId>()
                .map_err(|_| ApiError::BadRequest(format!("invalid job id in exclude: {s}")))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    limit: Option<usize>,
    exclude: Option<String>,
}

async fn matched_jobs(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Feed>, ApiError> {
    let user_id = UserId::new(user_id);
    rate_limit(&state, user_id)?;

    let exclude = parse_exclude(query.exclude.as_deref())?;
    let limit = state.feed.effective_limit(query.limit);
    let feed = state.matcher.feed(user_id, &exclude, limit).await?;
    Ok(Json(feed))
}

async fn unlocked_jobs(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UnlockedLead>>, ApiError> {
    let effective = state.repos.profiles.effective_user(UserId::new(user_id)).await?;
    let leads = state.repos.lead_actions.unlocked_jobs(effective).await?;
    Ok(Json(leads))
}

#[derive(Debug, Serialize)]
struct ActionResponse {
    user_id: UserId,
    job_id: JobId,
    /// False when the request was a no-op.
    changed: bool,
}

#[derive(Debug, Deserialize)]
struct UnlockQuery {
    credits: Option<i32>,
}

async fn unlock(
    State(state): State<AppState>,
    Path((user_id, job_id)): Path<(i64, i64)>,
    Query(query): Query<UnlockQuery>,
) -> Result<Json<ActionResponse>, ApiError> {
    let user_id = UserId::new(user_id);
    rate_limit(&state, user_id)?;

    let credits = query.credits.unwrap_or(1);
    if credits < 0 {
        return Err(ApiError::BadRequest("credits must not be negative".to_string()));
    }

    let effective = state.repos.profiles.effective_user(user_id).await?;
    let job_id = JobId::new(job_id);
    let changed = state
        .repos
        .lead_actions
        .unlock(effective, job_id, credits)
        .await?;
    if changed {
        info!(user_id = %effective, job_id = %job_id, credits, "Unlocked lead");
    }
    Ok(Json(ActionResponse {
        user_id: effective,
        job_id,
        changed,
    }))
}

async fn apply(
    state: &AppState,
    user_id: i64,
    job_id: i64,
    list: LeadList,
    add: bool,
) -> Result<Json<ActionResponse>, ApiError> {
    let user_id = UserId::new(user_id);
    rate_limit(state, user_id)?;

    let effective = state.repos.profiles.effective_user(user_id).await?;
    let job_id = JobId::new(job_id);
    let changed = if add {
        state.repos.lead_actions.add(list, effective, job_id).await?
    } else {
        state.repos.lead_actions.remove(list, effective, job_id).await?
    };
    Ok(Json(ActionResponse {
        user_id: effective,
        job_id,
        changed,
    }))
}

async fn save(
    State(state): State<AppState>,
    Path((user_id, job_id)): Path<(i64, i64)>,
) -> Result<Json<ActionResponse>, ApiError> {
    apply(&state, user_id, job_id, LeadList::Saved, true).await
}

async fn unsave(
    State(state): State<AppState>,
    Path((user_id, job_id)): Path<(i64, i64)>,
) -> Result<Json<ActionResponse>, ApiError> {
    apply(&state, user_id, job_id, LeadList::Saved, false).await
}

async fn not_interested(
    State(state): State<AppState>,
    Path((user_id, job_id)): Path<(i64, i64)>,
) -> Result<Json<ActionResponse>, ApiError> {
    apply(&state, user_id, job_id, LeadList::NotInterested, true).await
}
