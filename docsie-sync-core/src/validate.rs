//! Pre-flight check that both ends of the sync are reachable and authorised.

use serde::Serialize;
use tracing::{info, warn};

use crate::contract::{Downloader, Uploader};
use crate::error::Error;
use crate::model::KnowledgeBaseInfo;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadinessReport {
    pub workspace_count: Option<usize>,
    pub knowledge_base: Option<KnowledgeBaseInfo>,
    pub problems: Vec<String>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Lists source workspaces and looks up the destination knowledge base.
/// Failures end up in [`ReadinessReport::problems`]; this never returns an error.
pub async fn check_readiness<D, U>(
    downloader: &D,
    uploader: &U,
    knowledge_base_id: &str,
) -> ReadinessReport
where
    D: Downloader + ?Sized,
    U: Uploader + ?Sized,
{
    let mut report = ReadinessReport::default();

    match downloader.list_workspaces().await {
        Ok(workspaces) => {
            info!(count = workspaces.len(), "[VALIDATE] Docsie API reachable");
            report.workspace_count = Some(workspaces.len());
        }
        Err(e) => {
            warn!(error = %e, "[VALIDATE] Docsie check failed");
            report.problems.push(describe("Docsie", &e));
        }
    }

    match uploader.get_knowledge_base(knowledge_base_id).await {
        Ok(kb) => {
            info!(knowledge_base_id = %kb.id, "[VALIDATE] Maven knowledge base found");
            report.knowledge_base = Some(kb);
        }
        Err(e) => {
            warn!(knowledge_base_id, error = %e, "[VALIDATE] Maven check failed");
            let problem = match e.status() {
                Some(404) => format!("Maven: knowledge base '{}' not found", knowledge_base_id),
                _ => describe("Maven", &e),
            };
            report.problems.push(problem);
        }
    }

    report
}

fn describe(service: &str, error: &Error) -> String {
    if error.is_authentication() {
        format!("{}: authentication failed ({})", service, error)
    } else {
        format!("{}: {}", service, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockDownloader, MockUploader};
    use crate::model::Workspace;

    fn api_error(status: u16) -> Error {
        Error::Api {
            endpoint: "/x".into(),
            status,
            status_text: "Err".into(),
            message: String::new(),
        }
    }

    fn healthy_downloader() -> MockDownloader {
        let mut downloader = MockDownloader::new();
        downloader.expect_list_workspaces().returning(|| {
            Ok(vec![Workspace {
                id: "ws_1".into(),
                name: None,
            }])
        });
        downloader
    }

    #[tokio::test]
    async fn test_ready_when_both_checks_pass() {
        let downloader = healthy_downloader();
        let mut uploader = MockUploader::new();
        uploader.expect_get_knowledge_base().returning(|id| {
            Ok(KnowledgeBaseInfo {
                id: id.to_string(),
                name: Some("Docs".into()),
            })
        });

        let report = check_readiness(&downloader, &uploader, "kb_1").await;

        assert!(report.is_ready());
        assert_eq!(report.workspace_count, Some(1));
        assert_eq!(report.knowledge_base.map(|kb| kb.id), Some("kb_1".to_string()));
    }

    #[tokio::test]
    async fn test_authentication_failure_is_reported_not_raised() {
        let mut downloader = MockDownloader::new();
        downloader
            .expect_list_workspaces()
            .returning(|| Err(api_error(401)));
        let mut uploader = MockUploader::new();
        uploader
            .expect_get_knowledge_base()
            .returning(|_| Err(api_error(404)));

        let report = check_readiness(&downloader, &uploader, "kb_missing").await;

        assert!(!report.is_ready());
        assert_eq!(report.problems.len(), 2);
        assert!(report.problems[0].starts_with("Docsie: authentication failed"));
        assert!(report.problems[1].contains("kb_missing"));
        assert!(report.workspace_count.is_none());
    }
}
