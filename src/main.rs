use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{crawl, fetch, load_config, CrawlParams};

#[derive(Parser)]
#[command(
    name = "gallwatch",
    version,
    about = "Time-windowed discussion board crawler",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl recent posts and write one record per comment
    Crawl {
        /// Lookback window in calendar months
        #[arg(short, long, default_value = "1")]
        months_back: u32,

        /// Number of listing pages to scan
        #[arg(short = 'p', long, default_value = "3")]
        max_pages: u32,

        /// Reference date (YYYY-MM-DD); defaults to now
        #[arg(short, long)]
        reference_date: Option<NaiveDate>,

        /// Listing URL to crawl instead of the configured one
        #[arg(short, long)]
        listing_url: Option<String>,

        /// Directory receiving the result file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Stop after this many consecutive pages without a recent post
        #[arg(long)]
        stop_after_empty_pages: Option<u32>,
    },

    /// Fetch a single post and print its title and comments as JSON
    Fetch {
        /// Post URL
        #[arg(short, long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("gallwatch starting");

    match cli.command {
        Commands::Crawl {
            months_back,
            max_pages,
            reference_date,
            listing_url,
            output_dir,
            stop_after_empty_pages,
        } => {
            tracing::info!(
                months_back = %months_back,
                max_pages = %max_pages,
                reference_date = ?reference_date,
                listing_url = ?listing_url,
                "Starting crawl command"
            );
            crawl(
                config,
                CrawlParams {
                    months_back,
                    max_pages,
                    reference_date,
                    listing_url,
                    output_dir,
                    stop_after_empty_pages,
                },
            )
            .await?;
        }

        Commands::Fetch { url } => {
            tracing::info!(url = %url, "Starting fetch command");
            fetch(config, url).await?;
        }
    }

    tracing::info!("gallwatch completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("gallwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("gallwatch={level},warn"))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gallwatch=info,warn"))
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
