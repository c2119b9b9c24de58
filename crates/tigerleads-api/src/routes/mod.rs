//! API routes.

pub mod admin;
pub mod health;
pub mod jobs;
pub mod users;

use axum::Router;

use crate::AppState;

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_router())
        .merge(health::router())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/jobs", jobs::router())
        .nest("/admin", admin::router())
}
