#![doc = "docsie-sync-core: core library for the Docsie to Maven AGI connector."]

//! Holds the data model, the block-tree to Markdown converter, the record
//! transformer, retry and rate limiting, the Docsie API client, batched
//! upload and the sync orchestrator.
//!
//! The destination client lives in the `docsie-sync` crate; this crate only
//! sees it through [`contract::Uploader`].

pub mod contract;
pub mod convert;
pub mod docsie;
pub mod error;
pub mod http;
pub mod model;
pub mod rate_limit;
pub mod retry;
pub mod synchronise;
pub mod transform;
pub mod upload;
pub mod validate;

pub use error::{Error, Result};
