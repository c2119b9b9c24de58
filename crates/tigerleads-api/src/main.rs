//! Tiger Leads API server

use std::sync::Arc;

use tigerleads_api::{AppState, routes};
use tigerleads_config::{SystemConfig, load_system_config};
use tigerleads_db::{create_pool, run_migrations};
use tigerleads_scheduler::{PeriodicPass, PeriodicWorker};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "TIGERLEADS_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            info!(path = %path, "Loading configuration");
            load_system_config(&path)?
        }
        Err(_) => SystemConfig::from_env(),
    };

    info!("Connecting to database...");
    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    run_migrations(&pool).await?;
    info!("Database connected");

    let state = AppState::new(pool, &config);

    // Periodic passes
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = Vec::new();
    if config.lifecycle.enabled {
        let pass: Arc<dyn PeriodicPass> = state.lifecycle.clone();
        workers.push(PeriodicWorker::new(pass, config.lifecycle.interval).spawn(shutdown_rx.clone()));
    }
    if config.unlock_cap.enabled {
        let pass: Arc<dyn PeriodicPass> = state.unlock_cap.clone();
        workers.push(PeriodicWorker::new(pass, config.unlock_cap.interval).spawn(shutdown_rx.clone()));
    }

    let limiter = state.rate_limiter.clone();
    let prune_every = config.rate_limit.window;
    let mut prune_shutdown = shutdown_rx.clone();
    workers.push(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(prune_every);
        loop {
            tokio::select! {
                _ = ticker.tick() => limiter.prune(),
                _ = prune_shutdown.changed() => break,
            }
        }
    }));

    // Build router
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr = config.server.bind;
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    for worker in workers {
        worker.await?;
    }
    info!("Server stopped");

    Ok(())
}
