//! Batched upload of transformed documents into a knowledge base.
//!
//! Batches run one after another. Inside a batch every document is created
//! independently with retry; a document that still fails is recorded in the
//! [`UploadResult`] and the run moves on.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::contract::Uploader;
use crate::error::Result;
use crate::model::{TransformedDocument, UploadError, UploadResult};
use crate::retry::{with_retry, RetryPolicy};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 1;

pub struct BatchUploader<'a, U: Uploader + ?Sized> {
    uploader: &'a U,
    knowledge_base_id: String,
    batch_size: usize,
    concurrency: usize,
    retry: RetryPolicy,
}

impl<'a, U: Uploader + ?Sized> BatchUploader<'a, U> {
    pub fn new(uploader: &'a U, knowledge_base_id: impl Into<String>) -> Self {
        Self {
            uploader,
            knowledge_base_id: knowledge_base_id.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Documents in flight at once within a batch.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn upload(&self, documents: &[TransformedDocument]) -> UploadResult {
        let mut result = UploadResult {
            total: documents.len(),
            ..UploadResult::default()
        };
        if documents.is_empty() {
            return result;
        }

        let total_batches = documents.len().div_ceil(self.batch_size);
        for (index, batch) in documents.chunks(self.batch_size).enumerate() {
            let batch_number = index + 1;
            info!(
                batch = batch_number,
                total_batches,
                batch_size = batch.len(),
                knowledge_base_id = %self.knowledge_base_id,
                "[UPLOAD] Uploading batch"
            );

            // buffered() yields in input order, so errors stay in document order
            let outcomes: Vec<(&TransformedDocument, Result<()>)> = stream::iter(batch)
                .map(|document| async move { (document, self.upload_one(document).await) })
                .buffered(self.concurrency)
                .collect()
                .await;

            for (document, outcome) in outcomes {
                match outcome {
                    Ok(()) => result.success += 1,
                    Err(e) => {
                        warn!(
                            reference_id = %document.reference_id,
                            error = %e,
                            "[UPLOAD] Document failed"
                        );
                        result.failed += 1;
                        result.errors.push(UploadError {
                            reference_id: document.reference_id.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }

            info!(
                batch = batch_number,
                total_batches,
                success = result.success,
                failed = result.failed,
                "[UPLOAD] Batch complete"
            );
        }

        result
    }

    async fn upload_one(&self, document: &TransformedDocument) -> Result<()> {
        with_retry(&self.retry, &document.reference_id, || {
            self.uploader
                .create_document(&self.knowledge_base_id, document)
        })
        .await
    }
}
