use docsie_sync_core::contract::Downloader;
use docsie_sync_core::docsie::DocsieClient;
use docsie_sync_core::model::RecordContent;
use docsie_sync_core::rate_limit::RateLimiter;
use docsie_sync_core::Error;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn summaries(range: std::ops::Range<usize>) -> Value {
    Value::Array(
        range
            .map(|i| {
                json!({
                    "id": format!("doc_{}", i),
                    "name": format!("Doc {}", i),
                    "workspace": "ws_1"
                })
            })
            .collect(),
    )
}

fn client(server: &MockServer) -> DocsieClient {
    DocsieClient::new("test_key".into(), Some(server.uri()))
        .unwrap()
        .disable_rate_limit()
}

async fn mount_page(server: &MockServer, page: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/documents/"))
        .and(query_param("workspace", "ws_1"))
        .and(query_param("page", page))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": body })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_paginates_until_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, "1", summaries(0..100)).await;
    mount_page(&server, "2", summaries(100..200)).await;
    mount_page(&server, "3", summaries(200..250)).await;

    let docs = client(&server).list_documents("ws_1").await.unwrap();

    assert_eq!(docs.len(), 250);
    assert_eq!(docs[0].id, "doc_0");
    assert_eq!(docs[249].id, "doc_249");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_exact_multiple_needs_confirming_request() {
    let server = MockServer::start().await;
    mount_page(&server, "1", summaries(0..100)).await;
    mount_page(&server, "2", summaries(100..200)).await;
    mount_page(&server, "3", json!([])).await;

    let docs = client(&server).list_documents("ws_1").await.unwrap();

    assert_eq!(docs.len(), 200);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_workspaces_bare_array_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workspaces/"))
        .and(header("Authorization", "Bearer test_key"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "ws_1", "name": "Product docs"},
            {"id": 7, "name": null}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let workspaces = client(&server).list_workspaces().await.unwrap();

    assert_eq!(workspaces.len(), 2);
    assert_eq!(workspaces[0].name.as_deref(), Some("Product docs"));
    assert_eq!(workspaces[1].id, "7");
}

#[tokio::test]
async fn test_unauthorized_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workspaces/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
        .mount(&server)
        .await;

    let result = client(&server).list_workspaces().await;

    match result {
        Err(err @ Error::Api { .. }) => {
            assert!(err.is_authentication());
            assert_eq!(err.status(), Some(401));
            let msg = err.to_string();
            assert!(msg.contains("/workspaces/"));
            assert!(msg.contains("Invalid token"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/doc_1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = client(&server).get_document("doc_1").await;

    match result {
        Err(Error::Parse { endpoint, .. }) => assert_eq!(endpoint, "/documents/doc_1/"),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_document_with_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/doc_1/"))
        .and(header("Authorization", "Bearer test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "doc_1",
            "name": "Quick start",
            "content": {"blocks": [
                {"type": "header-two", "text": "Install"},
                {"type": "ordered-list-item", "text": "Download"}
            ]},
            "tags": ["intro"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client(&server).get_document("doc_1").await.unwrap();

    assert_eq!(record.id, "doc_1");
    assert_eq!(record.title, "Quick start");
    assert_eq!(record.tags, vec!["intro".to_string()]);
    match record.content {
        RecordContent::Blocks(tree) => assert_eq!(tree.blocks.len(), 2),
        other => panic!("expected blocks, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_document_tolerates_odd_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/doc_2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "doc_2",
            "title": "Setup",
            "name": "Setup",
            "workspace": "ws_1",
            "workspace_id": "ws_1",
            "content": {"blocks": [
                {"type": null, "text": "Intro"},
                {"type": "atomic:image", "data": {"src": "https://a/x.png", "url": "https://a/x.png"}}
            ]}
        })))
        .mount(&server)
        .await;

    let record = client(&server).get_document("doc_2").await.unwrap();

    assert_eq!(record.title, "Setup");
    assert_eq!(record.workspace_id.as_deref(), Some("ws_1"));
    match record.content {
        RecordContent::Blocks(tree) => assert_eq!(tree.blocks.len(), 2),
        other => panic!("expected blocks, got {:?}", other),
    }
}

#[tokio::test]
async fn test_single_permit_serialises_whole_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/doc_1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "doc_1", "name": "Slow"}))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = DocsieClient::new("test_key".into(), Some(server.uri()))
        .unwrap()
        .with_rate_limiter(RateLimiter::unthrottled(1));
    let started = Instant::now();

    let results = futures::future::join_all((0..3).map(|_| client.get_document("doc_1"))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(started.elapsed() >= Duration::from_millis(450));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = DocsieClient::new("test_key".into(), Some("http://127.0.0.1:1".into()))
        .unwrap()
        .disable_rate_limit();

    let result = client.list_workspaces().await;

    assert!(matches!(result, Err(Error::Network(_))));
}
