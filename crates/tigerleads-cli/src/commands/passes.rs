//! Migrations and one-shot passes.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tigerleads_core::PassOutcome;
use tigerleads_db::{PgLifecycleRepo, run_migrations};
use tigerleads_scheduler::{LifecycleProcessor, SystemClock, UnlockCapEnforcer};

use super::{connect, load_config};

pub async fn migrate(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let pool = connect(&config).await?;
    run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}

pub async fn lifecycle(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let pool = connect(&config).await?;
    let processor = LifecycleProcessor::new(
        Arc::new(PgLifecycleRepo::new(pool)),
        Arc::new(SystemClock),
        &config.lifecycle,
    );

    match processor.run_pass().await? {
        PassOutcome::Ran(report) => {
            println!("Posted (scheduled): {}", report.scheduled_posted);
            println!("Posted (approved):  {}", report.approval_posted);
            println!("Expired:            {}", report.expired);
            println!("Deleted:            {}", report.deleted);
            println!("Temp docs removed:  {}", report.temp_documents_removed);
        }
        PassOutcome::Skipped => println!("Skipped: another process is running the lifecycle pass"),
    }
    Ok(())
}

pub async fn unlock_cap(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let pool = connect(&config).await?;
    let enforcer = UnlockCapEnforcer::new(Arc::new(PgLifecycleRepo::new(pool)), &config.unlock_cap);

    match enforcer.run_pass().await? {
        PassOutcome::Ran(report) => {
            println!("Deleted:   {}", report.deleted);
            println!("Completed: {}", report.completed);
        }
        PassOutcome::Skipped => println!("Skipped: another process is running the unlock-cap pass"),
    }
    Ok(())
}
