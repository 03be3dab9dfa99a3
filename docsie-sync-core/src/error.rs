//! Error taxonomy shared by the HTTP clients and the sync pipeline.
//!
//! Fetch-phase calls surface these directly to the caller. Upload-phase
//! failures are caught per document by [`crate::upload`] and recorded as
//! [`crate::model::UploadError`] entries instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error {status} {status_text} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        status_text: String,
        message: String,
    },

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error("Parse error on {endpoint}: {source}")]
    Parse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// True for 401/403 responses: the credential was rejected.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Api { status: 401 | 403, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Truncates `s` to at most `max_chars` bytes on a char boundary, appending `...`.
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}
