//! HTTP client for the Docsie content API.
//!
//! Lists workspaces, lists the documents of a workspace, and fetches single
//! documents with their block-tree content. Listing endpoints are paginated
//! with `page`/`per_page`; every request goes through the client's
//! [`RateLimiter`].

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::contract::Downloader;
use crate::error::{Error, Result};
use crate::http::read_json;
use crate::model::{DocumentSummary, SourceRecord, Workspace};
use crate::rate_limit::RateLimiter;

pub const DEFAULT_BASE_URL: &str = "https://app.docsie.io/api_v2/003";
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of a listing: either `{"results": [...]}` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Page<T> {
    Wrapped { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Page<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Page::Wrapped { results } => results,
            Page::Bare(items) => items,
        }
    }
}

pub struct DocsieClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: usize,
    limiter: RateLimiter,
}

impl DocsieClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Configuration("Docsie API key is empty".into()));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());

        Ok(DocsieClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
            limiter: RateLimiter::default(),
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Drops request spacing; the concurrency cap stays.
    pub fn disable_rate_limit(mut self) -> Self {
        self.limiter = RateLimiter::unthrottled(self.limiter.max_concurrent());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .query(query);

        self.limiter
            .run(async move {
                let response = request.send().await?;
                read_json(endpoint, response).await
            })
            .await
    }

    /// Walks `page=1,2,...` until a page comes back shorter than `per_page`.
    async fn paginate<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let mut params = query.to_vec();
            params.push(("page", page.to_string()));
            params.push(("per_page", self.page_size.to_string()));

            let batch = self.get_json::<Page<T>>(endpoint, &params).await?.into_items();
            let received = batch.len();
            items.extend(batch);
            debug!(endpoint, page, received, total = items.len(), "Fetched page");

            if received < self.page_size {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl Downloader for DocsieClient {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        let workspaces: Vec<Workspace> = self.paginate("/workspaces/", &[]).await?;
        info!(count = workspaces.len(), "Listed Docsie workspaces");
        Ok(workspaces)
    }

    async fn list_documents(&self, workspace_id: &str) -> Result<Vec<DocumentSummary>> {
        let documents: Vec<DocumentSummary> = self
            .paginate("/documents/", &[("workspace", workspace_id.to_string())])
            .await?;
        info!(workspace_id, count = documents.len(), "Listed Docsie documents");
        Ok(documents)
    }

    async fn get_document(&self, document_id: &str) -> Result<SourceRecord> {
        let endpoint = format!("/documents/{}/", document_id);
        self.get_json(&endpoint, &[]).await
    }
}
