//! # contract: the two seams of the sync pipeline
//!
//! [`Downloader`] reads workspaces and documents from the documentation
//! source. [`Uploader`] writes transformed documents into a destination
//! knowledge base. The pipeline only ever talks to these traits, so the real
//! HTTP clients and `mockall` mocks are interchangeable.
//!
//! Mocks are generated under `cfg(test)` and, for downstream crates, behind
//! the `test-export-mocks` feature.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::Result;
use crate::model::{
    DocumentSummary, KnowledgeBaseInfo, SourceRecord, TransformedDocument, Workspace,
};

/// Read side. Listing calls return every page already concatenated.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>>;

    async fn list_documents(&self, workspace_id: &str) -> Result<Vec<DocumentSummary>>;

    /// Fetches one document including its content tree.
    async fn get_document(&self, document_id: &str) -> Result<SourceRecord>;
}

/// Write side. `create_document` is an upsert keyed by `reference_id`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn create_document(
        &self,
        knowledge_base_id: &str,
        document: &TransformedDocument,
    ) -> Result<()>;

    async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<KnowledgeBaseInfo>;
}
