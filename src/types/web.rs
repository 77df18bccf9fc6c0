use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PageId, RevisionId, WebId, WikiError};

/// Administrative settings of a web.
///
/// Only `brackets_only` influences rendering; the remaining flags are stored
/// for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSettings {
    /// When set, bare CamelCase words are plain text and only `[[...]]` links
    pub brackets_only: bool,
    pub safe_mode: bool,
    pub published: bool,
    pub count_pages: bool,
    pub allow_uploads: bool,
    /// Theme color (hex without `#`)
    pub color: String,
    pub additional_style: Option<String>,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            brackets_only: false,
            safe_mode: false,
            published: false,
            count_pages: false,
            allow_uploads: true,
            color: crate::constants::wiki::DEFAULT_COLOR.to_string(),
            additional_style: None,
        }
    }
}

/// A namespace of pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Web {
    pub id: WebId,
    pub name: String,
    /// URL-safe slug, unique across the wiki
    pub address: String,
    pub settings: WebSettings,
}

impl Web {
    /// Validate a web address.
    ///
    /// Addresses appear as path segments, so only ASCII alphanumerics, `-`
    /// and `_` are accepted.
    pub fn validate_address(address: &str) -> Result<(), WikiError> {
        if address.is_empty() {
            return Err(WikiError::invalid("web address", "must not be empty"));
        }
        if let Some(bad) = address
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(WikiError::invalid(
                "web address",
                format!("'{}' contains unsupported character '{}'", address, bad),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub web_id: WebId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable text snapshot of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub page_id: PageId,
    /// 1-based position in the page history
    pub number: u32,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}
