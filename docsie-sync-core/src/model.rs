//! Serde data models for Docsie records, the destination document, and run results.
//!
//! Parsing is tolerant: optional fields default, `null` is treated like a
//! missing value, ids may arrive as strings or numbers, and unknown block
//! types fall through to [`BlockKind::Unknown`] instead of failing. A value
//! of the wrong shape inside a block falls back to its default, so one odd
//! block never fails the whole record.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Name of the source system, used in document metadata.
pub const SOURCE_SYSTEM: &str = "docsie";

/// Content type tag sent with every uploaded document.
pub const CONTENT_TYPE_MARKDOWN: &str = "MARKDOWN";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdValue {
        Text(String),
        Number(i64),
    }

    Ok(match IdValue::deserialize(deserializer)? {
        IdValue::Text(s) => s,
        IdValue::Number(n) => n.to_string(),
    })
}

/// A string or number as text. Any other shape, including `null`, is `None`.
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Float(f64),
        Other(IgnoredAny),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => Some(s),
        Scalar::Integer(n) => Some(n.to_string()),
        Scalar::Float(n) => Some(n.to_string()),
        Scalar::Other(_) => None,
    })
}

/// Parses `T`, falling back to its default when the value has another shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Other(IgnoredAny),
    }

    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => value,
        Lenient::Other(_) => T::default(),
    })
}

/// Blocks that are not objects at all are dropped; everything else parses.
fn lenient_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Block(ContentBlock),
        Other(IgnoredAny),
    }

    let entries: Option<Vec<Entry>> = lenient(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match entry {
            Entry::Block(block) => Some(block),
            Entry::Other(_) => None,
        })
        .collect())
}

fn block_kind<'de, D>(deserializer: D) -> Result<BlockKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_text(deserializer)?.map(BlockKind::from).unwrap_or_default())
}

/// First candidate that is present and not blank.
fn first_filled<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A document as it appears in a workspace listing, without its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub workspace: Option<String>,
}

/// A full Docsie document. Read-only to the pipeline.
///
/// The API spells several fields more than one way, sometimes in the same
/// payload. Every spelling is read separately and the first filled one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireRecord")]
pub struct SourceRecord {
    pub id: String,
    pub title: String,
    pub content: RecordContent,
    pub tags: Vec<String>,
    pub slug: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub workspace_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct WireRecord {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default, deserialize_with = "loose_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    content: RecordContent,
    #[serde(default, deserialize_with = "lenient")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "loose_text")]
    slug: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    author: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    created_at: Option<String>,
    #[serde(default, rename = "createdAt", deserialize_with = "loose_text")]
    created_at_camel: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    updated_at: Option<String>,
    #[serde(default, rename = "updatedAt", deserialize_with = "loose_text")]
    updated_at_camel: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    workspace_id: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    workspace: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    project_id: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    book_id: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    book: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    status: Option<String>,
}

impl From<WireRecord> for SourceRecord {
    fn from(wire: WireRecord) -> Self {
        Self {
            id: wire.id,
            title: first_filled([wire.title, wire.name]).unwrap_or_default(),
            content: wire.content,
            tags: wire.tags,
            slug: wire.slug,
            author: wire.author,
            created_at: first_filled([wire.created_at, wire.created_at_camel]),
            updated_at: first_filled([wire.updated_at, wire.updated_at_camel]),
            workspace_id: first_filled([wire.workspace_id, wire.workspace]),
            project_id: first_filled([wire.project_id, wire.book_id, wire.book]),
            status: wire.status,
        }
    }
}

/// Either a block tree or, for the plain-string API variant, ready Markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordContent {
    Blocks(ContentTree),
    Markdown(String),
}

impl Default for RecordContent {
    fn default() -> Self {
        RecordContent::Blocks(ContentTree::default())
    }
}

impl RecordContent {
    /// True when there is nothing to convert: no blocks, or a blank string.
    pub fn is_empty(&self) -> bool {
        match self {
            RecordContent::Blocks(tree) => tree.blocks.is_empty(),
            RecordContent::Markdown(text) => text.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentTree {
    #[serde(default, deserialize_with = "lenient_blocks")]
    pub blocks: Vec<ContentBlock>,
}

impl ContentTree {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        Self { blocks }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, deserialize_with = "block_kind")]
    pub kind: BlockKind,
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub data: BlockData,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            data: BlockData::default(),
        }
    }

    pub fn with_data(mut self, data: BlockData) -> Self {
        self.data = data;
        self
    }
}

/// Closed set of block types. Wire names map many-to-one onto variants;
/// anything unrecognised is kept verbatim in `Unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading(u8),
    StepHeading,
    UnorderedListItem,
    OrderedListItem,
    Image,
    Video,
    Embed,
    Code,
    Chart,
    Container,
    Tiles,
    Unknown(String),
}

impl From<&str> for BlockKind {
    fn from(s: &str) -> Self {
        match s {
            "unstyled" | "paragraph" => BlockKind::Paragraph,
            "header-one" => BlockKind::Heading(1),
            "header-two" => BlockKind::Heading(2),
            "header-three" => BlockKind::Heading(3),
            "header-step" => BlockKind::StepHeading,
            "unordered-list-item" => BlockKind::UnorderedListItem,
            "ordered-list-item" => BlockKind::OrderedListItem,
            "image" | "figure" | "atomic:image" => BlockKind::Image,
            "video" | "atomic:video" => BlockKind::Video,
            "embed" | "atomic:embed" => BlockKind::Embed,
            "code" | "code-block" | "gist" | "atomic:gist" => BlockKind::Code,
            "chart" | "graph" | "atomic:chart" => BlockKind::Chart,
            "banner" | "content" => BlockKind::Container,
            "tiles" => BlockKind::Tiles,
            other => BlockKind::Unknown(other.to_string()),
        }
    }
}

impl From<String> for BlockKind {
    fn from(s: String) -> Self {
        BlockKind::from(s.as_str())
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Paragraph => "unstyled".into(),
            BlockKind::Heading(1) => "header-one".into(),
            BlockKind::Heading(3) => "header-three".into(),
            BlockKind::Heading(_) => "header-two".into(),
            BlockKind::StepHeading => "header-step".into(),
            BlockKind::UnorderedListItem => "unordered-list-item".into(),
            BlockKind::OrderedListItem => "ordered-list-item".into(),
            BlockKind::Image => "image".into(),
            BlockKind::Video => "video".into(),
            BlockKind::Embed => "embed".into(),
            BlockKind::Code => "gist".into(),
            BlockKind::Chart => "chart".into(),
            BlockKind::Container => "content".into(),
            BlockKind::Tiles => "tiles".into(),
            BlockKind::Unknown(other) => other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireBlockData")]
pub struct BlockData {
    pub src: Option<String>,
    pub label: Option<String>,
    pub content: Option<NestedNode>,
    pub tiles: Vec<Tile>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct WireBlockData {
    #[serde(deserialize_with = "loose_text")]
    src: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    url: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    label: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    caption: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    alt: Option<String>,
    #[serde(deserialize_with = "lenient")]
    content: Option<NestedNode>,
    #[serde(deserialize_with = "lenient")]
    tiles: Vec<Tile>,
}

impl From<WireBlockData> for BlockData {
    fn from(wire: WireBlockData) -> Self {
        Self {
            src: first_filled([wire.src, wire.url]),
            label: first_filled([wire.label, wire.caption, wire.alt]),
            content: wire.content,
            tiles: wire.tiles,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<NestedNode>,
}

/// A node of the rich-text sub-tree held by container blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedNode {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub node_type: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attrs: NodeAttrs,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Vec<NestedNode>,
}

impl NestedNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            node_type: "text".into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn node(node_type: impl Into<String>, content: Vec<NestedNode>) -> Self {
        Self {
            node_type: node_type.into(),
            content,
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.attrs.level = Some(level);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttrs {
    #[serde(default, deserialize_with = "lenient")]
    pub level: Option<u32>,
}

/// The destination-side projection of a [`SourceRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedDocument {
    pub reference_id: String,
    pub title: String,
    pub content: String,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseInfo {
    pub id: String,
    pub name: Option<String>,
}

/// A document whose upload failed on every attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadError {
    pub reference_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<UploadError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncResult {
    pub workspaces: usize,
    pub total_documents: usize,
    pub skipped: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub errors: Vec<UploadError>,
    pub duration_ms: u64,
}
