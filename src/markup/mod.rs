//! Markup Collaborators
//!
//! The rendering core consumes markup through [`MarkupEngine`]: given a
//! revision, a link resolver and options, an engine produces a
//! [`RenderingResult`] holding HTML and the typed chunks found on the way.
//!
//! [`WikiMarkup`] is the bundled grammar and [`UrlGenerator`] the bundled
//! link resolver.

pub mod chunk;
pub mod link_resolver;
pub mod wiki_markup;

pub use chunk::{Category, Chunk, Include, LinkKind, WikiLink, WikiReference};
pub use link_resolver::{LinkContext, LinkResolver, PageIndex, UrlGenerator, WebLookup};
pub use wiki_markup::WikiMarkup;

use std::fmt;

use serde::Serialize;

use crate::types::{Page, RenderMode, Result, Revision, RevisionId, Web};

// =============================================================================
// Engine Contract
// =============================================================================

/// Revision being rendered, with the page and web it belongs to
#[derive(Debug, Clone, Copy)]
pub struct RenderSource<'a> {
    pub web: &'a Web,
    pub page: &'a Page,
    pub revision: &'a Revision,
}

impl<'a> RenderSource<'a> {
    pub fn new(web: &'a Web, page: &'a Page, revision: &'a Revision) -> Self {
        Self {
            web,
            page,
            revision,
        }
    }
}

/// Supplies the latest content of pages named by inclusions
pub trait IncludeSource: Send + Sync {
    /// Latest content of `page_name` in `web`, or `None` if no such page
    fn included_content(&self, web: &Web, page_name: &str) -> Result<Option<String>>;
}

#[derive(Clone, Copy)]
pub struct RenderOptions<'a> {
    pub mode: RenderMode,
    pub includes: Option<&'a dyn IncludeSource>,
    pub max_include_depth: usize,
}

impl fmt::Debug for RenderOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("mode", &self.mode)
            .field("includes", &self.includes.is_some())
            .field("max_include_depth", &self.max_include_depth)
            .finish()
    }
}

/// Turns revision text into HTML while collecting chunks
pub trait MarkupEngine: Send + Sync {
    fn render(
        &self,
        source: &RenderSource<'_>,
        resolver: &dyn LinkResolver,
        options: &RenderOptions<'_>,
    ) -> Result<RenderingResult>;
}

// =============================================================================
// Rendering Result
// =============================================================================

/// HTML produced for one revision under one mode, plus every chunk found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderingResult {
    html: String,
    chunks: Vec<Chunk>,
    mode: RenderMode,
    revision_id: RevisionId,
}

impl RenderingResult {
    pub fn new(
        html: impl Into<String>,
        chunks: Vec<Chunk>,
        mode: RenderMode,
        revision_id: RevisionId,
    ) -> Self {
        Self {
            html: html.into(),
            chunks,
            mode,
            revision_id,
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn revision_id(&self) -> RevisionId {
        self.revision_id
    }

    /// Every link chunk, escaped or not, in document order
    pub fn wiki_links(&self) -> impl Iterator<Item = &WikiLink> {
        self.chunks.iter().filter_map(Chunk::as_wiki_link)
    }

    pub fn includes(&self) -> impl Iterator<Item = &Include> {
        self.chunks.iter().filter_map(Chunk::as_include)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.chunks.iter().filter_map(Chunk::as_category)
    }

    /// Links of every kind and inclusions
    pub fn wiki_references(&self) -> impl Iterator<Item = &dyn WikiReference> {
        self.chunks.iter().filter_map(Chunk::as_wiki_reference)
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

impl fmt::Display for RenderingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

// =============================================================================
// HTML Helpers
// =============================================================================

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
