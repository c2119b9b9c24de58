//! CLI command implementations.

pub mod feed;
pub mod passes;

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tigerleads_config::{SystemConfig, load_system_config};
use tigerleads_db::create_pool;

/// Load the configuration file if one was given, else defaults plus env.
pub fn load_config(path: Option<&Path>) -> Result<SystemConfig> {
    match path {
        Some(path) => load_system_config(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(SystemConfig::from_env()),
    }
}

pub async fn connect(config: &SystemConfig) -> Result<PgPool> {
    create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")
}

pub fn validate(path: &Path) -> Result<()> {
    let config = load_system_config(path)
        .with_context(|| format!("Configuration error in {}", path.display()))?;
    println!("Configuration is valid");
    for line in describe(&config) {
        println!("  {line}");
    }
    Ok(())
}

fn describe(config: &SystemConfig) -> Vec<String> {
    let schedule = |enabled: bool, interval: std::time::Duration| {
        if enabled {
            format!("every {} min", interval.as_secs() / 60)
        } else {
            "disabled".to_string()
        }
    };
    vec![
        format!("server: {}", config.server.bind),
        format!(
            "lifecycle: {}, lock key {}, permit statuses {:?}",
            schedule(config.lifecycle.enabled, config.lifecycle.interval),
            config.lifecycle.lock_key,
            config.lifecycle.permit_statuses.as_slice()
        ),
        format!(
            "unlock-cap: {}, lock key {}, threshold {}",
            schedule(config.unlock_cap.enabled, config.unlock_cap.interval),
            config.unlock_cap.lock_key,
            config.unlock_cap.threshold
        ),
        format!(
            "feed: default {} max {}",
            config.feed.default_limit, config.feed.max_limit
        ),
        format!(
            "rate limit: {} requests per {}s",
            config.rate_limit.max_requests,
            config.rate_limit.window.as_secs()
        ),
    ]
}
