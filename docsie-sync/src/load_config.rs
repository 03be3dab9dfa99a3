/// `load_config` module: assembles the runtime configuration from environment
/// variables (secrets, endpoints) and an optional YAML tuning file (batch
/// sizes, concurrency, retry, workspace selection).
///
/// The YAML file never holds secrets. Every key in it is optional; anything
/// left out keeps the library default.
///
/// # Errors
/// All errors use `anyhow::Error` and name the variable or file at fault.
use anyhow::{Context, Result};
use docsie_sync_core::docsie::{DocsieClient, DEFAULT_PAGE_SIZE};
use docsie_sync_core::rate_limit::{RateLimiter, DEFAULT_MAX_CONCURRENT, DEFAULT_MIN_INTERVAL};
use docsie_sync_core::retry::RetryPolicy;
use docsie_sync_core::synchronise::{SyncSettings, DEFAULT_KNOWLEDGE_BASE_ID};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::upload::{MavenClient, MavenCredentials};

pub const ENV_DOCSIE_API_KEY: &str = "DOCSIE_API_KEY";
pub const ENV_DOCSIE_BASE_URL: &str = "DOCSIE_BASE_URL";
pub const ENV_MAVEN_ORGANIZATION_ID: &str = "MAVEN_ORGANIZATION_ID";
pub const ENV_MAVEN_AGENT_ID: &str = "MAVEN_AGENT_ID";
pub const ENV_MAVEN_APP_ID: &str = "MAVEN_APP_ID";
pub const ENV_MAVEN_APP_SECRET: &str = "MAVEN_APP_SECRET";
pub const ENV_MAVEN_BASE_URL: &str = "MAVEN_BASE_URL";
pub const ENV_MAVEN_KNOWLEDGE_BASE_ID: &str = "MAVEN_KNOWLEDGE_BASE_ID";

/// YAML tuning file as written by the user.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TuningFile {
    pub source: SourceSection,
    pub rate_limit: RateLimitSection,
    pub upload: UploadSection,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub page_size: Option<usize>,
    pub workspace_ids: Option<Vec<String>>,
    pub fetch_concurrency: Option<usize>,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitSection {
    pub max_concurrent: Option<usize>,
    pub min_interval_ms: Option<u64>,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadSection {
    pub batch_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub retry: RetrySection,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub max_delay_ms: Option<u64>,
}

#[derive(Clone, PartialEq)]
pub struct DocsieSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub page_size: usize,
}

impl std::fmt::Debug for DocsieSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsieSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    pub max_concurrent: usize,
    pub min_interval: Duration,
}

impl RateLimitSettings {
    pub fn limiter(&self) -> RateLimiter {
        RateLimiter::new(self.max_concurrent, self.min_interval)
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub docsie: DocsieSettings,
    pub maven: MavenCredentials,
    pub maven_base_url: Option<String>,
    pub rate_limit: RateLimitSettings,
    pub sync: SyncSettings,
}

impl AppConfig {
    pub fn trace_loaded(&self) {
        info!(
            knowledge_base_id = %self.sync.knowledge_base_id,
            workspace_filter = ?self.sync.workspace_ids,
            batch_size = self.sync.batch_size,
            page_size = self.docsie.page_size,
            "Loaded AppConfig"
        );
        debug!(?self, "AppConfig loaded (full debug)");
    }

    /// Each client gets its own limiter with the configured limits.
    pub fn docsie_client(&self) -> Result<DocsieClient> {
        let client = DocsieClient::new(self.docsie.api_key.clone(), self.docsie.base_url.clone())
            .context("Failed to construct Docsie client")?
            .with_page_size(self.docsie.page_size)
            .with_rate_limiter(self.rate_limit.limiter());
        Ok(client)
    }

    pub fn maven_client(&self) -> Result<MavenClient> {
        let client = MavenClient::new(self.maven.clone(), self.maven_base_url.clone())
            .context("Failed to construct Maven client")?
            .with_rate_limiter(self.rate_limit.limiter());
        Ok(client)
    }
}

/// Reads and parses the YAML tuning file. An empty file means all defaults.
pub fn load_tuning<P: AsRef<Path>>(path: P) -> Result<TuningFile> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading tuning configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    if content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(TuningFile::default());
    }

    let tuning: TuningFile = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(tuning)
}

/// Resolves the run configuration from the environment plus an optional tuning file.
pub fn load_config(tuning_path: Option<&Path>) -> Result<AppConfig> {
    let tuning = match tuning_path {
        Some(path) => load_tuning(path)?,
        None => TuningFile::default(),
    };

    let docsie = DocsieSettings {
        api_key: require_env(ENV_DOCSIE_API_KEY)?,
        base_url: optional_env(ENV_DOCSIE_BASE_URL),
        page_size: tuning.source.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
    };

    let maven = MavenCredentials {
        organization_id: require_env(ENV_MAVEN_ORGANIZATION_ID)?,
        agent_id: require_env(ENV_MAVEN_AGENT_ID)?,
        app_id: require_env(ENV_MAVEN_APP_ID)?,
        app_secret: require_env(ENV_MAVEN_APP_SECRET)?,
    };

    let rate_limit = RateLimitSettings {
        max_concurrent: tuning.rate_limit.max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT),
        min_interval: tuning
            .rate_limit
            .min_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MIN_INTERVAL),
    };

    let defaults = SyncSettings::default();
    let retry_defaults = RetryPolicy::default();
    let retry = &tuning.upload.retry;
    let sync = SyncSettings {
        knowledge_base_id: optional_env(ENV_MAVEN_KNOWLEDGE_BASE_ID)
            .unwrap_or_else(|| DEFAULT_KNOWLEDGE_BASE_ID.to_string()),
        workspace_ids: tuning.source.workspace_ids.filter(|ids| !ids.is_empty()),
        fetch_concurrency: tuning.source.fetch_concurrency.unwrap_or(defaults.fetch_concurrency),
        batch_size: tuning.upload.batch_size.unwrap_or(defaults.batch_size),
        upload_concurrency: tuning.upload.concurrency.unwrap_or(defaults.upload_concurrency),
        retry: RetryPolicy {
            max_attempts: retry.max_attempts.unwrap_or(retry_defaults.max_attempts),
            initial_delay: retry
                .initial_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.initial_delay),
            backoff_multiplier: retry
                .backoff_multiplier
                .unwrap_or(retry_defaults.backoff_multiplier),
            max_delay: retry
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.max_delay),
        },
    };

    Ok(AppConfig {
        docsie,
        maven,
        maven_base_url: optional_env(ENV_MAVEN_BASE_URL),
        rate_limit,
        sync,
    })
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            error!(variable = name, "Required environment variable missing");
            Err(anyhow::anyhow!(
                "Missing required environment variable {}",
                name
            ))
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
