use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobcrate::commands;
use jobcrate::config::Config;

#[derive(Parser)]
#[command(
    name = "jobcrate",
    version,
    about = "Resilient, checkpointed job-listing ingestion pipeline",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Config file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest listing URLs then fetch and persist job details
    Crawl {
        /// Platform to crawl (linkedin, naukri)
        #[arg(short, long)]
        platform: Option<String>,

        /// Role keyword to search for
        #[arg(short, long)]
        role: Option<String>,

        /// Location filter
        #[arg(short, long)]
        location: Option<String>,

        /// Number of listings to collect
        #[arg(short, long)]
        target_count: Option<usize>,

        /// SQLite database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },

    /// Resume an interrupted session from the existing store
    Resume {
        /// SQLite database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },

    /// Show per-platform scraped-job counts
    Stats {
        /// SQLite database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let mut config = Config::load_with_fallback(Some(&cli.config))?;

    match cli.command {
        Commands::Crawl {
            platform,
            role,
            location,
            target_count,
            db_path,
        } => {
            if let Some(p) = platform {
                config.pipeline.platform = p;
            }
            if let Some(r) = role {
                config.pipeline.input_role = r;
            }
            if let Some(l) = location {
                config.pipeline.location = Some(l);
            }
            if let Some(t) = target_count {
                config.pipeline.target_count = t;
            }
            if let Some(d) = db_path {
                config.pipeline.db_path = d;
            }

            tracing::info!(
                platform = %config.pipeline.platform,
                role = %config.pipeline.input_role,
                target_count = config.pipeline.target_count,
                "starting crawl"
            );
            commands::crawl(config).await?;
        }

        Commands::Resume { db_path } => {
            if let Some(d) = db_path {
                config.pipeline.db_path = d;
            }
            commands::resume(config).await?;
        }

        Commands::Stats { db_path } => {
            if let Some(d) = db_path {
                config.pipeline.db_path = d;
            }
            commands::stats(config)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("jobcrate=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("jobcrate=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
