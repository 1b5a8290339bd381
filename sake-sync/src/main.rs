//! sake-sync - catalog synchronization entry point
//!
//! Runs one synchronization against the configured store and exits:
//! 0 on success, non-zero on any unrecovered error. In dry-run mode the
//! change preview is printed to stdout and nothing is written to the store.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sake_sync::build_info;
use sake_sync::config::{Args, SyncConfig};
use sake_sync::db::CatalogRepository;
use sake_sync::services::{HttpCatalogSource, Reporter, SyncOptions, SyncOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Resolved before tracing starts: the TOML file may set the log level
    let config = SyncConfig::load(&args).context("Failed to resolve configuration")?;

    // Initialize tracing (RUST_LOG wins over the configured level)
    let default_filter = format!("sake_sync={0},sake_common={0}", config.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting sake-sync v{} ({}, built {}, {})",
        build_info::VERSION,
        build_info::GIT_HASH,
        build_info::BUILT_AT,
        build_info::PROFILE
    );
    config.log_summary();

    let pool = sake_common::db::init_database(&config.database_path)
        .await
        .context("Failed to open database")?;
    let repository = CatalogRepository::new(pool);

    let source = HttpCatalogSource::new(config.source_url.clone(), config.fetch_timeout)
        .context("Failed to create catalog client")?;

    let orchestrator = SyncOrchestrator::new(
        repository,
        source,
        Reporter::new(config.report_dir.clone()),
        SyncOptions::new(config.dry_run, config.lock_stale_after),
    );

    let outcome = orchestrator.run().await.context("Synchronization failed")?;

    if let Some(preview) = &outcome.preview {
        print!("{}", preview);
    }

    info!(
        generation_id = outcome.generation_id,
        inserted = outcome.counts.inserted,
        updated = outcome.counts.updated,
        deleted = outcome.counts.deleted,
        unchanged = outcome.counts.unchanged,
        severity = outcome.summary.severity.as_str(),
        report = %outcome.report_path.display(),
        "Done"
    );

    Ok(())
}
