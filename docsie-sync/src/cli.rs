///
/// This module implements the CLI interface for docsie-sync: command parsing,
/// the async entrypoint and the user-visible summaries.
///
/// All pipeline logic (fetching, conversion, upload, readiness checks) lives in
/// the [`docsie-sync-core`] crate. This module only wires configuration and
/// clients into it and reports the outcome.
///
/// ## How To Use
/// - From the shell: `docsie-sync sync` or `docsie-sync validate`, optionally
///   with `--config tuning.yaml`.
/// - Programmatically and in tests: call [`run`] with a constructed [`Cli`].
///
/// [`docsie-sync-core`]: ../../docsie-sync-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsie_sync_core::model::SyncResult;
use docsie_sync_core::synchronise::sync_all;
use docsie_sync_core::validate::{check_readiness, ReadinessReport};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// CLI for docsie-sync: copy Docsie documentation into a Maven AGI knowledge base.
#[derive(Parser)]
#[clap(
    name = "docsie-sync",
    version,
    about = "One-way sync of Docsie documentation into a Maven AGI knowledge base"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every Docsie document and upload it to the knowledge base
    Sync {
        /// Optional YAML tuning file (batch sizes, concurrency, retry, workspaces)
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Check both APIs and the target knowledge base without uploading anything
    Validate {
        /// Optional YAML tuning file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => run_sync(config.as_deref()).await,
        Commands::Validate { config } => run_validate(config.as_deref()).await,
    }
}

async fn run_sync(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    config.trace_loaded();
    tracing::info!(command = "sync", "Starting synchronisation process");

    let downloader = config.docsie_client()?;
    let uploader = config.maven_client()?;

    let result = sync_all(&config.sync, &downloader, &uploader)
        .await
        .map_err(|e| {
            tracing::error!(command = "sync", error = %e, "Synchronisation failed");
            e
        })
        .context("Synchronisation failed")?;

    tracing::info!(command = "sync", ?result, "Synchronisation complete");
    print!("{}", format_summary(&result));
    Ok(())
}

async fn run_validate(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    config.trace_loaded();
    tracing::info!(command = "validate", "Checking connectivity and credentials");

    let downloader = config.docsie_client()?;
    let uploader = config.maven_client()?;

    let report = check_readiness(&downloader, &uploader, &config.sync.knowledge_base_id).await;
    print!("{}", format_report(&report, &config.sync.knowledge_base_id));

    if report.is_ready() {
        tracing::info!(command = "validate", "Validation passed");
        Ok(())
    } else {
        tracing::error!(
            command = "validate",
            problems = report.problems.len(),
            "Validation failed"
        );
        Err(anyhow::anyhow!(
            "Validation failed with {} problem(s)",
            report.problems.len()
        ))
    }
}

/// Human-readable run summary followed by one line per failed document.
pub fn format_summary(result: &SyncResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sync complete");
    let _ = writeln!(out, "  Workspaces: {}", result.workspaces);
    let _ = writeln!(out, "  Documents:  {}", result.total_documents);
    let _ = writeln!(out, "  Uploaded:   {}", result.uploaded);
    let _ = writeln!(out, "  Failed:     {}", result.failed);
    let _ = writeln!(out, "  Skipped:    {}", result.skipped);
    let _ = writeln!(out, "  Duration:   {:.1}s", result.duration_ms as f64 / 1000.0);

    if !result.errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        for err in &result.errors {
            let _ = writeln!(out, "  - {}: {}", err.reference_id, err.message);
        }
    }
    out
}

pub fn format_report(report: &ReadinessReport, knowledge_base_id: &str) -> String {
    let mut out = String::new();
    match report.workspace_count {
        Some(count) => {
            let _ = writeln!(out, "[OK] Docsie: {} workspace(s) visible", count);
        }
        None => {
            let _ = writeln!(out, "[FAIL] Docsie: not reachable");
        }
    }
    match &report.knowledge_base {
        Some(kb) => {
            let _ = writeln!(
                out,
                "[OK] Maven: knowledge base '{}'{}",
                kb.id,
                kb.name.as_deref().map(|n| format!(" ({})", n)).unwrap_or_default()
            );
        }
        None => {
            let _ = writeln!(
                out,
                "[FAIL] Maven: knowledge base '{}' unavailable",
                knowledge_base_id
            );
        }
    }
    for problem in &report.problems {
        let _ = writeln!(out, "  - {}", problem);
    }
    out
}
