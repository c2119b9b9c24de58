//! Tiger Leads operator CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tigerleads")]
#[command(about = "Tiger Leads operator CLI", long_about = None)]
struct Cli {
    /// Path to the KDL configuration file
    #[arg(long, env = "TIGERLEADS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run one lifecycle pass now
    Lifecycle,
    /// Run one unlock-cap pass now
    UnlockCap,
    /// Print a user's matched feed
    Feed {
        /// User ID
        user_id: i64,
        /// Maximum number of jobs to show
        #[arg(long)]
        limit: Option<usize>,
        /// Job IDs to leave out, comma separated
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<i64>,
    },
    /// Explain why a job is or is not in a user's feed
    Explain {
        /// User ID
        user_id: i64,
        /// Job ID
        job_id: i64,
    },
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "tigerleads.kdl")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Migrate => {
            commands::passes::migrate(config_path).await?;
        }
        Commands::Lifecycle => {
            commands::passes::lifecycle(config_path).await?;
        }
        Commands::UnlockCap => {
            commands::passes::unlock_cap(config_path).await?;
        }
        Commands::Feed {
            user_id,
            limit,
            exclude,
        } => {
            commands::feed::feed(config_path, user_id, limit, exclude).await?;
        }
        Commands::Explain { user_id, job_id } => {
            commands::feed::explain(config_path, user_id, job_id).await?;
        }
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
    }

    Ok(())
}
