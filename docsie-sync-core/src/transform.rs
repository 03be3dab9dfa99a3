//! Maps Docsie records onto the destination document schema.
//!
//! Pure and deterministic: the same record always yields a byte-identical
//! [`TransformedDocument`]. Re-running a sync therefore updates the existing
//! destination document keyed by `reference_id` instead of creating a new one.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeMap;

use crate::convert::content_to_markdown;
use crate::model::{SourceRecord, TransformedDocument, CONTENT_TYPE_MARKDOWN, SOURCE_SYSTEM};

const UNTITLED: &str = "Untitled document";

pub fn transform_record(record: &SourceRecord) -> TransformedDocument {
    let title = match record.title.trim() {
        "" => UNTITLED.to_string(),
        _ => record.title.clone(),
    };

    let mut content = content_to_markdown(&record.content);
    if content.is_empty() {
        content = title.clone();
    }

    TransformedDocument {
        reference_id: record.id.clone(),
        title,
        content,
        content_type: CONTENT_TYPE_MARKDOWN.to_string(),
        metadata: build_metadata(record),
        created_at: record.created_at.as_deref().and_then(parse_timestamp),
        updated_at: record.updated_at.as_deref().and_then(parse_timestamp),
    }
}

pub fn transform_all(records: &[SourceRecord]) -> Vec<TransformedDocument> {
    records.iter().map(transform_record).collect()
}

fn build_metadata(record: &SourceRecord) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("source".to_string(), SOURCE_SYSTEM.to_string());
    metadata.insert(format!("{}_id", SOURCE_SYSTEM), record.id.clone());

    let tags: Vec<&str> = record
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !tags.is_empty() {
        metadata.insert("tags".to_string(), tags.join(","));
    }

    let optional = [
        ("slug", &record.slug),
        ("author", &record.author),
        ("workspace_id", &record.workspace_id),
        ("project_id", &record.project_id),
        ("status", &record.status),
    ];
    for (key, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            metadata.insert(key.to_string(), value.to_string());
        }
    }

    metadata
}

/// Parses RFC 3339, or a zone-less timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
