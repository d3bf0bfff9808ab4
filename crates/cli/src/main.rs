//! Outlet catalog command line.
//!
//! # Usage
//!
//! ```bash
//! # Preview a catalog sync, then apply it
//! outlet-sync sync --catalog catalogo.json
//! outlet-sync sync --catalog catalogo.json --apply
//!
//! # Sort a collection by discount percentage
//! outlet-sync reorder --collection-id 123456789 --apply
//!
//! # Force prices back onto already-built outlets
//! outlet-sync fix-prices --catalog catalogo.json --apply
//! ```
//!
//! Every command previews by default; `--apply` executes the mutations.
//! Exits 0 on full success, 1 when any group failed or configuration was
//! invalid.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use outlet_sync_core::{CollectionId, ReconcileOutcome, ReconcileStep, RunSummary};
use outlet_sync_engine::config::{Config, ConfigError};
use outlet_sync_engine::price_fix::run_price_fix;
use outlet_sync_engine::reconcile::{ReconcileError, run_sync};
use outlet_sync_engine::reorder::run_reorder;
use outlet_sync_engine::shopify::{ShopifyClient, ShopifyError};

mod catalog;

use catalog::{CatalogError, WriteBackEntry};

#[derive(Parser)]
#[command(name = "outlet-sync")]
#[command(author, version, about = "Spreadsheet-to-outlet catalog reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the catalog into outlet products
    Sync {
        /// Canonical JSON catalog file
        #[arg(long)]
        catalog: PathBuf,

        /// Execute mutations instead of previewing
        #[arg(long)]
        apply: bool,
    },
    /// Sort a collection by discount percentage
    Reorder {
        /// Numeric collection id (falls back to COLLECTION_ID)
        #[arg(long)]
        collection_id: Option<u64>,

        /// Execute mutations instead of previewing
        #[arg(long)]
        apply: bool,
    },
    /// Overwrite variant prices on already-built outlets
    FixPrices {
        /// Canonical JSON catalog file
        #[arg(long)]
        catalog: PathBuf,

        /// Execute mutations instead of previewing
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Gateway(#[from] ShopifyError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("no collection id: pass --collection-id or set COLLECTION_ID")]
    MissingCollectionId,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    exit_code(run(cli).await)
}

/// `Ok(true)` exits 0; a partial failure or an aborted run exits 1.
fn exit_code(outcome: Result<bool, CliError>) -> ExitCode {
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            ExitCode::FAILURE
        }
    }
}

/// A built outlet whose id could not be persisted counts as a failed group.
fn record_write_back_failure(summary: &mut RunSummary, entries: &[WriteBackEntry], reason: &str) {
    for entry in entries {
        summary.record(
            entry.sku.clone(),
            ReconcileOutcome::Failed {
                step: ReconcileStep::WriteBack,
                reason: reason.to_owned(),
            },
        );
    }
}

/// Dispatch a command; `Ok(false)` means the run finished but some group
/// failed, which still exits non-zero.
async fn run(cli: Cli) -> Result<bool, CliError> {
    match cli.command {
        Commands::Sync { catalog, apply } => {
            let groups = catalog::load_groups(&catalog)?;
            tracing::info!(groups = groups.len(), apply, "catalog loaded");

            let config = Config::from_env()?;
            let client = ShopifyClient::new(&config)?;
            let mut summary = run_sync(&client, &config, &groups, apply).await?;
            tracing::info!(%summary, "sync finished");

            let entries: Vec<WriteBackEntry> = summary
                .results
                .iter()
                .filter_map(|result| {
                    let outlet = result.outcome.write_back_id()?;
                    let group = groups.iter().find(|g| g.sku == result.sku)?;
                    Some(WriteBackEntry {
                        sku: result.sku.clone(),
                        outlet_id: outlet.as_str().to_owned(),
                        rows: group.row_indices(),
                    })
                })
                .collect();
            if !entries.is_empty() {
                match catalog::append_write_back(&catalog, &entries) {
                    Ok(path) => tracing::info!(
                        step = %ReconcileStep::WriteBack,
                        path = %path.display(),
                        entries = entries.len(),
                        "outlet ids written back"
                    ),
                    Err(err) => {
                        record_write_back_failure(&mut summary, &entries, &err.to_string());
                        tracing::error!(step = %ReconcileStep::WriteBack, error = %err, "write-back failed");
                    }
                }
            }

            Ok(!summary.had_failures())
        }
        Commands::Reorder { collection_id, apply } => {
            let numeric = collection_id
                .or_else(|| env::var("COLLECTION_ID").ok()?.trim().parse().ok())
                .ok_or(CliError::MissingCollectionId)?;
            let collection = CollectionId::from_numeric(numeric);

            let config = Config::from_env()?;
            let client = ShopifyClient::new(&config)?;
            let report = run_reorder(&client, &collection, apply).await?;
            tracing::info!(
                products = report.ranked.len(),
                batches = report.batches,
                timed_out_jobs = report.timed_out_jobs,
                applied = report.applied,
                "reorder finished"
            );

            Ok(true)
        }
        Commands::FixPrices { catalog, apply } => {
            let groups = catalog::load_groups(&catalog)?;
            tracing::info!(groups = groups.len(), apply, "catalog loaded");

            let config = Config::from_env()?;
            let client = ShopifyClient::new(&config)?;
            let summary = run_price_fix(&client, &groups, apply).await;
            tracing::info!(
                fixed = summary.fixed,
                would_fix = summary.would_fix,
                skipped_no_product_id = summary.skipped_no_product_id,
                skipped_not_found = summary.skipped_not_found,
                skipped_draft = summary.skipped_draft,
                failed = summary.failed,
                "price fix finished"
            );

            Ok(!summary.had_errors())
        }
    }
}
