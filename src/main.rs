//! Daily enrichment API performance reporter.
//!
//! Queries the last 24 hours of enrichment call records from MongoDB,
//! aggregates overall and per-user statistics, writes them to a timestamped
//! CSV in the working directory, and emails that CSV to the configured
//! recipient. Intended to be invoked once a day by an external scheduler:
//! the binary takes no arguments, reads its settings from the environment,
//! and always exits 0, logging any failure it runs into.

mod analysis;
mod config;
mod error;
mod mailer;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use config::Config;
use store::RecordStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Seed the environment from a .env file when one is present.
    dotenvy::dotenv().ok();

    init_logging();

    let config = Config::from_env();

    // Failures are logged, never propagated: the run exits cleanly either
    // way and the next scheduled invocation starts fresh.
    if let Err(e) = run(&config).await {
        error!("Report run failed: {:#}", e);
    }
}

/// Initialize logging. Level comes from `RUST_LOG`, defaulting to `info`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Run the complete report workflow: fetch, aggregate, format, deliver.
///
/// No step is retried; the first failure ends the run before any later
/// step executes.
async fn run(config: &Config) -> Result<()> {
    let now = Utc::now();

    let store = RecordStore::connect(&config.store).await?;
    let records = store.fetch_window(now).await?;

    if records.is_empty() {
        info!("No records in the last 24 hours; nothing to report");
        return Ok(());
    }

    let result = analysis::analyze(&records);
    info!(
        "Analyzed {} calls across {} users",
        result.overall.total_calls,
        result.user_stats.len()
    );

    let csv = report::generate(&result, now)?;
    std::fs::write(&csv.filename, &csv.bytes)
        .with_context(|| format!("Failed to write report to {}", csv.filename))?;
    info!("Report written to {}", csv.filename);

    mailer::send_report(&config.mail, &result, &csv, now).await?;

    Ok(())
}
