//! High-level pipeline: fetch → filter → transform → upload.
//!
//! [`sync_all`] walks every selected Docsie workspace, fetches each of its
//! documents in full, drops the ones without content, converts the rest into
//! destination documents and hands them to a [`BatchUploader`].
//!
//! # Error Handling
//! Any failure while fetching aborts the run and is returned unchanged.
//! Upload failures never abort; they are counted and itemised in the
//! returned [`SyncResult`].

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::contract::{Downloader, Uploader};
use crate::error::Result;
use crate::model::{SourceRecord, SyncResult, Workspace};
use crate::retry::RetryPolicy;
use crate::transform::transform_all;
use crate::upload::{BatchUploader, DEFAULT_BATCH_SIZE, DEFAULT_UPLOAD_CONCURRENCY};

pub const DEFAULT_KNOWLEDGE_BASE_ID: &str = "docsie-kb";
pub const DEFAULT_FETCH_CONCURRENCY: usize = 5;

/// Everything a run needs besides the two clients.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub knowledge_base_id: String,
    /// When set, only these workspaces are synchronised.
    pub workspace_ids: Option<Vec<String>>,
    pub fetch_concurrency: usize,
    pub batch_size: usize,
    pub upload_concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            knowledge_base_id: DEFAULT_KNOWLEDGE_BASE_ID.to_string(),
            workspace_ids: None,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }
}

pub async fn sync_all<D, U>(
    settings: &SyncSettings,
    downloader: &D,
    uploader: &U,
) -> Result<SyncResult>
where
    D: Downloader + ?Sized,
    U: Uploader + ?Sized,
{
    let started = Instant::now();
    info!(
        knowledge_base_id = %settings.knowledge_base_id,
        "[SYNC] Starting Docsie synchronisation"
    );

    let workspaces = downloader.list_workspaces().await.map_err(|e| {
        error!(error = %e, "[SYNC][ERROR] Failed to list workspaces");
        e
    })?;
    let workspaces = select_workspaces(workspaces, settings.workspace_ids.as_deref());
    info!(count = workspaces.len(), "[SYNC] Workspaces selected");

    let mut records: Vec<SourceRecord> = Vec::new();
    for workspace in &workspaces {
        let fetched = fetch_workspace(downloader, workspace, settings.fetch_concurrency).await?;
        records.extend(fetched);
    }

    let total_documents = records.len();
    let (records, empty): (Vec<SourceRecord>, Vec<SourceRecord>) =
        records.into_iter().partition(|record| !record.content.is_empty());
    for record in &empty {
        debug!(id = %record.id, title = %record.title, "[SYNC] Skipping document without content");
    }

    let mut result = SyncResult {
        workspaces: workspaces.len(),
        total_documents,
        skipped: empty.len(),
        ..SyncResult::default()
    };

    if records.is_empty() {
        info!(
            total_documents,
            skipped = result.skipped,
            "[SYNC] Nothing to upload"
        );
        result.duration_ms = elapsed_ms(started);
        return Ok(result);
    }

    let documents = transform_all(&records);
    info!(count = documents.len(), "[SYNC] Transformed documents");

    let upload = BatchUploader::new(uploader, settings.knowledge_base_id.clone())
        .with_batch_size(settings.batch_size)
        .with_concurrency(settings.upload_concurrency)
        .with_retry_policy(settings.retry.clone())
        .upload(&documents)
        .await;

    result.uploaded = upload.success;
    result.failed = upload.failed;
    result.errors = upload.errors;
    result.duration_ms = elapsed_ms(started);

    info!(
        workspaces = result.workspaces,
        total_documents = result.total_documents,
        uploaded = result.uploaded,
        failed = result.failed,
        skipped = result.skipped,
        duration_ms = result.duration_ms,
        "[SYNC] Synchronisation finished"
    );
    Ok(result)
}

fn select_workspaces(workspaces: Vec<Workspace>, wanted: Option<&[String]>) -> Vec<Workspace> {
    let Some(wanted) = wanted else {
        return workspaces;
    };

    for id in wanted {
        if !workspaces.iter().any(|w| &w.id == id) {
            warn!(workspace_id = %id, "[SYNC] Configured workspace not found");
        }
    }
    workspaces
        .into_iter()
        .filter(|w| wanted.contains(&w.id))
        .collect()
}

async fn fetch_workspace<D>(
    downloader: &D,
    workspace: &Workspace,
    concurrency: usize,
) -> Result<Vec<SourceRecord>>
where
    D: Downloader + ?Sized,
{
    let summaries = downloader.list_documents(&workspace.id).await.map_err(|e| {
        error!(workspace_id = %workspace.id, error = %e, "[SYNC][ERROR] Failed to list documents");
        e
    })?;
    info!(
        workspace_id = %workspace.id,
        workspace_name = workspace.name.as_deref().unwrap_or(""),
        documents = summaries.len(),
        "[SYNC] Fetching documents"
    );

    stream::iter(summaries.iter())
        .map(|summary| downloader.get_document(&summary.id))
        .buffered(concurrency.max(1))
        .try_collect::<Vec<SourceRecord>>()
        .await
        .map_err(|e| {
            error!(
                workspace_id = %workspace.id,
                error = %e,
                "[SYNC][ERROR] Failed to fetch document"
            );
            e
        })
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
