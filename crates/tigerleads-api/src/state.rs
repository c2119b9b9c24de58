//! Application state.

use std::sync::Arc;

use sqlx::PgPool;
use tigerleads_config::{FeedConfig, SystemConfig};
use tigerleads_db::{
    FeedRepo, JobRepo, LeadActionRepo, LeadMatcher, LifecycleRepo, PgFeedRepo, PgJobRepo,
    PgLeadActionRepo, PgLifecycleRepo, PgProfileRepo, ProfileRepo,
};
use tigerleads_scheduler::{Clock, LifecycleProcessor, SystemClock, UnlockCapEnforcer};

use crate::rate_limit::RateLimiter;

/// Repository handles the routes and passes work against.
#[derive(Clone)]
pub struct Repos {
    pub jobs: Arc<dyn JobRepo>,
    pub profiles: Arc<dyn ProfileRepo>,
    pub lead_actions: Arc<dyn LeadActionRepo>,
    pub feed: Arc<dyn FeedRepo>,
    pub lifecycle: Arc<dyn LifecycleRepo>,
}

impl Repos {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            jobs: Arc::new(PgJobRepo::new(pool.clone())),
            profiles: Arc::new(PgProfileRepo::new(pool.clone())),
            lead_actions: Arc::new(PgLeadActionRepo::new(pool.clone())),
            feed: Arc::new(PgFeedRepo::new(pool.clone())),
            lifecycle: Arc::new(PgLifecycleRepo::new(pool.clone())),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub repos: Repos,
    pub matcher: LeadMatcher,
    pub lifecycle: Arc<LifecycleProcessor>,
    pub unlock_cap: Arc<UnlockCapEnforcer>,
    pub rate_limiter: Arc<RateLimiter>,
    pub feed: FeedConfig,
}

impl AppState {
    pub fn new(pool: PgPool, config: &SystemConfig) -> Self {
        let repos = Repos::postgres(&pool);
        Self::with_repos(pool, repos, Arc::new(SystemClock), config)
    }

    pub fn with_repos(
        pool: PgPool,
        repos: Repos,
        clock: Arc<dyn Clock>,
        config: &SystemConfig,
    ) -> Self {
        let matcher = LeadMatcher::new(
            repos.profiles.clone(),
            repos.lead_actions.clone(),
            repos.feed.clone(),
            repos.jobs.clone(),
        );
        let lifecycle = Arc::new(LifecycleProcessor::new(
            repos.lifecycle.clone(),
            clock,
            &config.lifecycle,
        ));
        let unlock_cap = Arc::new(UnlockCapEnforcer::new(
            repos.lifecycle.clone(),
            &config.unlock_cap,
        ));

        Self {
            pool,
            repos,
            matcher,
            lifecycle,
            unlock_cap,
            rate_limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            feed: config.feed.clone(),
        }
    }
}
