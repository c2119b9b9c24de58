//! Database layer for Tiger Leads.
//!
//! Provides repository traits and PostgreSQL implementations.

pub mod error;
pub mod matcher;
pub mod repo;

pub use error::{DbError, DbResult};
pub use matcher::{Feed, FeedExplanation, LeadMatcher};
pub use repo::*;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Round-trip a trivial query to check the pool can reach the server.
pub async fn ping(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
