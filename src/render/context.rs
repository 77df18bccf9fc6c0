//! Render context: the collaborators a rendering engine works with.

use std::sync::Arc;

use super::diff::{HtmlDiffer, WordDiff};
use crate::config::RenderConfig;
use crate::constants::render as defaults;
use crate::markup::{IncludeSource, LinkResolver, MarkupEngine, WikiMarkup};
use crate::types::{Result, WikiError};

#[derive(Clone)]
pub struct RenderContext {
    pub link_resolver: Arc<dyn LinkResolver>,
    pub includes: Option<Arc<dyn IncludeSource>>,
    pub markup: Arc<dyn MarkupEngine>,
    pub differ: Arc<dyn HtmlDiffer>,
    pub max_include_depth: usize,
    pub cache_enabled: bool,
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("includes", &self.includes.is_some())
            .field("max_include_depth", &self.max_include_depth)
            .field("cache_enabled", &self.cache_enabled)
            .finish_non_exhaustive()
    }
}

impl RenderContext {
    pub fn builder() -> RenderContextBuilder {
        RenderContextBuilder::default()
    }
}

#[derive(Default)]
pub struct RenderContextBuilder {
    link_resolver: Option<Arc<dyn LinkResolver>>,
    includes: Option<Arc<dyn IncludeSource>>,
    markup: Option<Arc<dyn MarkupEngine>>,
    differ: Option<Arc<dyn HtmlDiffer>>,
    max_include_depth: Option<usize>,
    cache_enabled: Option<bool>,
}

impl RenderContextBuilder {
    pub fn link_resolver(mut self, resolver: Arc<dyn LinkResolver>) -> Self {
        self.link_resolver = Some(resolver);
        self
    }

    pub fn includes(mut self, includes: Arc<dyn IncludeSource>) -> Self {
        self.includes = Some(includes);
        self
    }

    pub fn markup(mut self, markup: Arc<dyn MarkupEngine>) -> Self {
        self.markup = Some(markup);
        self
    }

    pub fn differ(mut self, differ: Arc<dyn HtmlDiffer>) -> Self {
        self.differ = Some(differ);
        self
    }

    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = Some(depth);
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    /// Apply the `[render]` config section
    pub fn config(self, config: &RenderConfig) -> Self {
        self.max_include_depth(config.max_include_depth)
            .cache_enabled(config.cache_enabled)
    }

    /// Build the context.
    ///
    /// # Errors
    ///
    /// [`WikiError::MissingLinkResolver`] when no link resolver was given.
    pub fn build(self) -> Result<RenderContext> {
        let link_resolver = self.link_resolver.ok_or(WikiError::MissingLinkResolver)?;

        Ok(RenderContext {
            link_resolver,
            includes: self.includes,
            markup: self.markup.unwrap_or_else(|| Arc::new(WikiMarkup)),
            differ: self.differ.unwrap_or_else(|| Arc::new(WordDiff)),
            max_include_depth: self
                .max_include_depth
                .unwrap_or(defaults::MAX_INCLUDE_DEPTH),
            cache_enabled: self.cache_enabled.unwrap_or(true),
        })
    }
}
