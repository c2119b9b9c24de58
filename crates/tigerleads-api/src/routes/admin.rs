//! Admin triggers for the periodic passes.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tigerleads_core::{CapReport, PassOutcome, TransitionReport};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lifecycle/run", post(run_lifecycle))
        .route("/unlock-cap/run", post(run_unlock_cap))
}

async fn run_lifecycle(
    State(state): State<AppState>,
) -> Result<Json<PassOutcome<TransitionReport>>, ApiError> {
    info!("Manual lifecycle pass requested");
    Ok(Json(state.lifecycle.run_pass().await?))
}

async fn run_unlock_cap(
    State(state): State<AppState>,
) -> Result<Json<PassOutcome<CapReport>>, ApiError> {
    info!("Manual unlock-cap pass requested");
    Ok(Json(state.unlock_cap.run_pass().await?))
}
