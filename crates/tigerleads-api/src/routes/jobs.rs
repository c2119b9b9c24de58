//! Admin job endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use tigerleads_core::{Job, JobId, JobReviewStatus};
use tigerleads_db::JobRepo;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{job_id}", get(get_job).delete(delete_job))
        .route("/{job_id}/status", put(set_status))
}

async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<Job>, ApiError> {
    let job = state.repos.jobs.get_by_id(JobId::new(job_id)).await?;
    Ok(Json(job))
}

async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repos.jobs.delete(JobId::new(job_id)).await?;
    info!(job_id, "Deleted job");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    status: String,
}

async fn set_status(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<Job>, ApiError> {
    let status: JobReviewStatus = req.status.parse()?;
    let job = state
        .repos
        .jobs
        .set_review_status(JobId::new(job_id), status)
        .await?;
    info!(job_id, status = %status, "Set job review status");
    Ok(Json(job))
}
