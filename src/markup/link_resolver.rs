//! Link resolution.
//!
//! A [`LinkResolver`] turns a page, file or picture reference into HTML for
//! the requested mode. [`UrlGenerator`] decides existence from a
//! [`PageIndex`] snapshot taken before rendering.

use std::collections::{HashMap, HashSet};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::{LinkKind, escape_html};
use crate::types::{Page, RenderMode, Result, Web, WebId};

/// Everything except RFC 3986 unreserved characters is escaped in a path segment
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkContext {
    pub mode: RenderMode,
    pub kind: LinkKind,
}

impl LinkContext {
    pub fn new(mode: RenderMode, kind: LinkKind) -> Self {
        Self { mode, kind }
    }
}

/// Produces hyperlinks, or "create page" affordances for missing targets.
///
/// Implementations receive raw names and text and must return safe HTML.
pub trait LinkResolver: Send + Sync {
    fn make_link(&self, web: &Web, page_name: &str, text: &str, context: LinkContext) -> String;

    fn category_link(&self, web: &Web, category: &str, mode: RenderMode) -> String;
}

/// Page lookup by name within a web
pub trait WebLookup {
    fn page(&self, web: &Web, name: &str) -> Result<Option<Page>>;

    fn page_exists(&self, web: &Web, name: &str) -> Result<bool> {
        Ok(self.page(web, name)?.is_some())
    }
}

// =============================================================================
// Page Index
// =============================================================================

/// Snapshot of page names per web
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    pages: HashMap<WebId, HashSet<String>>,
}

impl PageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, web_id: WebId, name: impl Into<String>) {
        self.pages.entry(web_id).or_default().insert(name.into());
    }

    pub fn contains(&self, web_id: WebId, name: &str) -> bool {
        self.pages
            .get(&web_id)
            .is_some_and(|names| names.contains(name))
    }

    /// Total number of pages across webs
    pub fn len(&self) -> usize {
        self.pages.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<(WebId, S)> for PageIndex {
    fn from_iter<I: IntoIterator<Item = (WebId, S)>>(iter: I) -> Self {
        let mut index = PageIndex::new();
        for (web_id, name) in iter {
            index.insert(web_id, name);
        }
        index
    }
}

// =============================================================================
// URL Generator
// =============================================================================

#[derive(Debug, Clone)]
pub struct UrlGenerator {
    base_url: String,
    index: PageIndex,
}

impl UrlGenerator {
    pub fn new(base_url: impl Into<String>, index: PageIndex) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, index }
    }

    pub fn index(&self) -> &PageIndex {
        &self.index
    }

    fn web_url(&self, web: &Web, action: &str, name: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            encode(&web.address),
            action,
            encode(name)
        )
    }

    fn page_link(&self, web: &Web, name: &str, text: &str, mode: RenderMode) -> String {
        let text = escape_html(text);
        let exists = self.index.contains(web.id, name);

        match (mode, exists) {
            (RenderMode::Display, true) => format!(
                r#"<a class="existingWikiWord" href="{}">{}</a>"#,
                self.web_url(web, "show", name),
                text
            ),
            (RenderMode::Display, false) => format!(
                r#"<span class="newWikiWord">{}<a href="{}">?</a></span>"#,
                text,
                self.web_url(web, "show", name)
            ),
            (RenderMode::Publish, true) => format!(
                r#"<a class="existingWikiWord" href="{}">{}</a>"#,
                self.web_url(web, "published", name),
                text
            ),
            (RenderMode::Export, true) => format!(
                r#"<a class="existingWikiWord" href="{}.html">{}</a>"#,
                encode(name),
                text
            ),
            (RenderMode::Publish | RenderMode::Export, false) => {
                format!(r#"<span class="newWikiWord">{}</span>"#, text)
            }
        }
    }
}

impl LinkResolver for UrlGenerator {
    fn make_link(&self, web: &Web, page_name: &str, text: &str, context: LinkContext) -> String {
        match context.kind {
            LinkKind::Page => self.page_link(web, page_name, text, context.mode),
            LinkKind::File => format!(
                r#"<a class="existingWikiFile" href="{}">{}</a>"#,
                self.web_url(web, "file", page_name),
                escape_html(text)
            ),
            LinkKind::Picture => format!(
                r#"<img alt="{}" src="{}" />"#,
                escape_html(text),
                self.web_url(web, "file", page_name)
            ),
        }
    }

    fn category_link(&self, web: &Web, category: &str, mode: RenderMode) -> String {
        match mode {
            RenderMode::Export => {
                format!(r#"<span class="category_link">{}</span>"#, escape_html(category))
            }
            RenderMode::Display | RenderMode::Publish => format!(
                r#"<a class="category_link" href="{}">{}</a>"#,
                self.web_url(web, "list", category),
                escape_html(category)
            ),
        }
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}
