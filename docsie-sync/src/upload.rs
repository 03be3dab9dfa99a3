#![doc = "Maven AGI client: the concrete `Uploader` used by the CLI."]
//
//! # Maven AGI knowledge API
//!
//! [`MavenClient`] implements [`docsie_sync_core::contract::Uploader`] over
//! HTTP. Documents are created with `POST /v1/knowledge/{kb}/document`; the
//! API treats the body's `documentId.referenceId` as the identity, so sending
//! the same document again updates it in place.
//!
//! Every request carries the organization and agent headers plus HTTP basic
//! auth with the app id and secret, and is throttled by the client's own
//! [`RateLimiter`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use docsie_sync_core::contract::Uploader;
use docsie_sync_core::http::{ensure_success, read_json};
use docsie_sync_core::model::{KnowledgeBaseInfo, TransformedDocument};
use docsie_sync_core::rate_limit::RateLimiter;
use docsie_sync_core::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.mavenagi-apis.com";

/// Credentials for one Maven AGI app installed on an agent.
#[derive(Clone, PartialEq)]
pub struct MavenCredentials {
    pub organization_id: String,
    pub agent_id: String,
    pub app_id: String,
    pub app_secret: String,
}

impl std::fmt::Debug for MavenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MavenCredentials")
            .field("organization_id", &self.organization_id)
            .field("agent_id", &self.agent_id)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

impl MavenCredentials {
    fn missing_field(&self) -> Option<&'static str> {
        [
            ("organization_id", &self.organization_id),
            ("agent_id", &self.agent_id),
            ("app_id", &self.app_id),
            ("app_secret", &self.app_secret),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityIdRef<'a> {
    reference_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentRequest<'a> {
    document_id: EntityIdRef<'a>,
    title: &'a str,
    content: &'a str,
    content_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a TransformedDocument> for CreateDocumentRequest<'a> {
    fn from(doc: &'a TransformedDocument) -> Self {
        CreateDocumentRequest {
            document_id: EntityIdRef {
                reference_id: &doc.reference_id,
            },
            title: &doc.title,
            content: &doc.content,
            content_type: &doc.content_type,
            metadata: (!doc.metadata.is_empty()).then_some(&doc.metadata),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityId {
    reference_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeBaseResponse {
    knowledge_base_id: EntityId,
    #[serde(default)]
    name: Option<String>,
}

pub struct MavenClient {
    client: Client,
    base_url: String,
    credentials: MavenCredentials,
    limiter: RateLimiter,
}

impl MavenClient {
    pub fn new(credentials: MavenCredentials, base_url: Option<String>) -> Result<Self> {
        if let Some(field) = credentials.missing_field() {
            tracing::error!(field, "Maven credential is empty");
            return Err(Error::Configuration(format!("Maven {} is empty", field)));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());

        tracing::info!(
            organization_id = %credentials.organization_id,
            agent_id = %credentials.agent_id,
            base_url = %base_url,
            "Initialized MavenClient"
        );

        Ok(MavenClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            limiter: RateLimiter::default(),
        })
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn disable_rate_limit(mut self) -> Self {
        self.limiter = RateLimiter::unthrottled(self.limiter.max_concurrent());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.credentials.app_id, Some(&self.credentials.app_secret))
            .header("X-Organization-Id", &self.credentials.organization_id)
            .header("X-Agent-Id", &self.credentials.agent_id)
            .header(ACCEPT, "application/json")
    }
}

#[async_trait]
impl Uploader for MavenClient {
    async fn create_document(
        &self,
        knowledge_base_id: &str,
        document: &TransformedDocument,
    ) -> Result<()> {
        let endpoint = format!("/v1/knowledge/{}/document", knowledge_base_id);
        let url = format!("{}{}", self.base_url, endpoint);
        let body = CreateDocumentRequest::from(document);

        tracing::debug!(
            knowledge_base_id,
            reference_id = %document.reference_id,
            "Creating knowledge document"
        );
        let request = self.authorised(self.client.post(&url)).json(&body);
        self.limiter
            .run(async {
                let response = request.send().await?;
                ensure_success(&endpoint, response).await
            })
            .await?;

        tracing::info!(
            knowledge_base_id,
            reference_id = %document.reference_id,
            "Knowledge document stored"
        );
        Ok(())
    }

    async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<KnowledgeBaseInfo> {
        let endpoint = format!("/v1/knowledge/{}", knowledge_base_id);
        let url = format!("{}{}", self.base_url, endpoint);

        let request = self.authorised(self.client.get(&url));
        let kb: KnowledgeBaseResponse = self
            .limiter
            .run(async {
                let response = request.send().await?;
                read_json(&endpoint, response).await
            })
            .await?;

        Ok(KnowledgeBaseInfo {
            id: kb.knowledge_base_id.reference_id,
            name: kb.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> MavenCredentials {
        MavenCredentials {
            organization_id: "org".into(),
            agent_id: "agent".into(),
            app_id: "app".into(),
            app_secret: "secret".into(),
        }
    }

    #[test]
    fn test_empty_credential_is_configuration_error() {
        let creds = MavenCredentials {
            agent_id: " ".into(),
            ..credentials()
        };
        match MavenClient::new(creds, None) {
            Err(Error::Configuration(msg)) => assert!(msg.contains("agent_id")),
            Err(other) => panic!("expected configuration error, got {other:?}"),
            Ok(_) => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_default_base_url() {
        let client = MavenClient::new(credentials(), None).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("\"secret\""));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_request_body_omits_absent_fields() {
        let doc = TransformedDocument {
            reference_id: "doc_1".into(),
            title: "T".into(),
            content: "C".into(),
            content_type: "MARKDOWN".into(),
            metadata: BTreeMap::new(),
            created_at: None,
            updated_at: None,
        };
        let json = serde_json::to_value(CreateDocumentRequest::from(&doc)).unwrap();
        assert_eq!(json["documentId"]["referenceId"], "doc_1");
        assert_eq!(json["contentType"], "MARKDOWN");
        assert!(json.get("metadata").is_none());
        assert!(json.get("createdAt").is_none());
    }
}
