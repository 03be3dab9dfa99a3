use serial_test::serial;
use std::env;
use std::fs::write;
use std::time::Duration;
use tempfile::NamedTempFile;

use docsie_sync::load_config::{load_config, load_tuning, TuningFile};

const REQUIRED: [(&str, &str); 5] = [
    ("DOCSIE_API_KEY", "docsie-key"),
    ("MAVEN_ORGANIZATION_ID", "org_1"),
    ("MAVEN_AGENT_ID", "agent_1"),
    ("MAVEN_APP_ID", "app_1"),
    ("MAVEN_APP_SECRET", "app-secret"),
];

const OPTIONAL: [&str; 3] = ["DOCSIE_BASE_URL", "MAVEN_BASE_URL", "MAVEN_KNOWLEDGE_BASE_ID"];

fn set_required_env() {
    for (name, value) in REQUIRED {
        env::set_var(name, value);
    }
    for name in OPTIONAL {
        env::remove_var(name);
    }
}

fn yaml_file(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), content).unwrap();
    file
}

#[test]
#[serial]
fn test_env_only_uses_defaults() {
    set_required_env();

    let config = load_config(None).expect("Config should load");

    assert_eq!(config.docsie.api_key, "docsie-key");
    assert_eq!(config.docsie.base_url, None);
    assert_eq!(config.docsie.page_size, 100);
    assert_eq!(config.maven.organization_id, "org_1");
    assert_eq!(config.maven.app_secret, "app-secret");
    assert_eq!(config.sync.knowledge_base_id, "docsie-kb");
    assert_eq!(config.sync.batch_size, 50);
    assert_eq!(config.sync.upload_concurrency, 1);
    assert_eq!(config.sync.fetch_concurrency, 5);
    assert_eq!(config.sync.retry.max_attempts, 3);
    assert_eq!(config.rate_limit.max_concurrent, 5);
    assert_eq!(config.rate_limit.min_interval, Duration::from_millis(200));
    assert!(config.sync.workspace_ids.is_none());
}

#[test]
#[serial]
fn test_optional_env_overrides() {
    set_required_env();
    env::set_var("MAVEN_KNOWLEDGE_BASE_ID", "kb_custom");
    env::set_var("DOCSIE_BASE_URL", "http://localhost:4000/api");

    let config = load_config(None).unwrap();

    assert_eq!(config.sync.knowledge_base_id, "kb_custom");
    assert_eq!(config.docsie.base_url.as_deref(), Some("http://localhost:4000/api"));
    for name in OPTIONAL {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_missing_required_variable_is_named() {
    set_required_env();
    env::remove_var("MAVEN_APP_SECRET");

    let err = load_config(None).expect_err("missing secret must fail");

    assert!(err.to_string().contains("MAVEN_APP_SECRET"), "got: {err}");
}

#[test]
#[serial]
fn test_blank_required_variable_counts_as_missing() {
    set_required_env();
    env::set_var("DOCSIE_API_KEY", "   ");

    let err = load_config(None).unwrap_err();

    assert!(err.to_string().contains("DOCSIE_API_KEY"));
}

#[test]
#[serial]
fn test_tuning_file_overrides_defaults() {
    set_required_env();
    let file = yaml_file(
        r#"
source:
  page_size: 25
  workspace_ids: ["ws_1", "ws_2"]
  fetch_concurrency: 2
rate_limit:
  max_concurrent: 3
  min_interval_ms: 50
upload:
  batch_size: 10
  concurrency: 4
  retry:
    max_attempts: 5
    initial_delay_ms: 250
    backoff_multiplier: 1.5
    max_delay_ms: 4000
"#,
    );

    let config = load_config(Some(file.path())).expect("Config should load");

    assert_eq!(config.docsie.page_size, 25);
    assert_eq!(
        config.sync.workspace_ids,
        Some(vec!["ws_1".to_string(), "ws_2".to_string()])
    );
    assert_eq!(config.sync.fetch_concurrency, 2);
    assert_eq!(config.rate_limit.max_concurrent, 3);
    assert_eq!(config.rate_limit.min_interval, Duration::from_millis(50));
    assert_eq!(config.sync.batch_size, 10);
    assert_eq!(config.sync.upload_concurrency, 4);
    assert_eq!(config.sync.retry.max_attempts, 5);
    assert_eq!(config.sync.retry.initial_delay, Duration::from_millis(250));
    assert_eq!(config.sync.retry.backoff_multiplier, 1.5);
    assert_eq!(config.sync.retry.max_delay, Duration::from_millis(4000));
}

#[test]
fn test_partial_and_empty_tuning_files() {
    let partial = yaml_file("upload:\n  batch_size: 7\n");
    let tuning = load_tuning(partial.path()).unwrap();
    assert_eq!(tuning.upload.batch_size, Some(7));
    assert_eq!(tuning.source.page_size, None);

    let empty = yaml_file("");
    let tuning = load_tuning(empty.path()).unwrap();
    assert_eq!(tuning, TuningFile::default());
}

#[test]
fn test_unknown_key_is_rejected() {
    let file = yaml_file("upload:\n  batch_sise: 7\n");
    let err = load_tuning(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
fn test_missing_file_is_reported() {
    let err = load_tuning("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
