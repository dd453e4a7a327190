mod config;
mod inspector;
mod message;
mod report;
mod store;
mod store_impl;

use crate::config::{Args, Config};
use crate::report::Report;
use crate::store_impl::postgres::PostgresStore;
use anyhow::{Error, Result};
use clap::Parser;
use std::io;
use tracing::{debug, error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    // Must run before the arguments are parsed so that clap sees the values.
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    // Logs go to stderr, stdout carries the report.
    // Override with RUST_LOG env var, e.g.: RUST_LOG=question_inspector=debug
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .init();

    match dotenv {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }

    let config = Config::from(args);
    info!(
        "Inspecting {} (window: {}h, fallback limit: {})",
        config.database, config.inspect.window_hours, config.inspect.fallback_limit
    );

    let stdout = io::stdout();
    let mut report = Report::new(stdout.lock());

    match inspector::run(PostgresStore::connect(&config.database), &config, &mut report).await {
        Ok(Some(summary)) => debug!(
            "Run finished: {} columns, {} recent questions, fallback {:?}, counts {:?}",
            summary.columns, summary.recent_questions, summary.fallback_questions, summary.counts
        ),
        Ok(None) => info!("No database connection, nothing inspected"),
        Err(e) => {
            error!("Inspection aborted: {:?}", e);
            // Best effort: the error itself is returned below.
            let _ = report.failure("during inspection", &format!("{:#}", e));
            return Err(e);
        }
    }
    Ok(())
}
