//! USD1 Daily Report
//!
//! Collects lending markets, stablecoin market caps and exchange volumes for
//! USD1 and posts a single summary message to Telegram.

mod config;
mod pipeline;

use clap::Parser;
use config::AppConfig;
use pipeline::Pipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit code for configuration errors.
const EXIT_CONFIG: u8 = 2;

/// USD1 Daily Report CLI
#[derive(Parser, Debug)]
#[command(name = "usd1-report")]
#[command(about = "Daily USD1 market report for Telegram", long_about = None)]
struct Args {
    /// Configuration file path (defaults to ./config.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the report instead of sending it
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before reading configuration; existing variables win
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Starting USD1 daily report");

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    if let Err(e) = config.validate(args.dry_run) {
        error!(error = %e, "Invalid configuration");
        return ExitCode::from(EXIT_CONFIG);
    }
    info!(
        asset = %config.target_symbol,
        stablecoins = ?config.stablecoin_symbols,
        timeout_secs = config.http.timeout_secs,
        max_retries = config.http.max_retries,
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    let pipeline = match Pipeline::from_config(&config, args.dry_run) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Failed to initialize report pipeline");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let outcome = pipeline.run(chrono::Utc::now()).await;
    info!(?outcome, "Run finished");
    ExitCode::from(outcome.exit_code())
}
