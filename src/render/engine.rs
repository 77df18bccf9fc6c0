//! Rendering Engine
//!
//! [`RenderingEngine`] is a pure function of (revision text, mode, context).
//! [`PageRenderer`] binds the engine to one revision and memoizes its
//! results; it is the entry point for display, publish, export and diff
//! requests and for reference synchronization.

use std::sync::Arc;

use super::cache::{CacheStats, NameSet, RenderCache};
use super::context::RenderContext;
use crate::markup::{RenderOptions, RenderSource, RenderingResult, WebLookup};
use crate::references::{self, ReferenceStore, ReferenceSynchronizer, SyncReport};
use crate::types::{Page, RenderMode, Result, Revision, Web, WikiError};

/// Access to the chronological predecessor of a revision
pub trait RevisionHistory {
    fn previous_revision(&self, revision: &Revision) -> Result<Option<Revision>>;
}

// =============================================================================
// Rendering Engine
// =============================================================================

#[derive(Debug, Clone)]
pub struct RenderingEngine {
    context: Arc<RenderContext>,
}

impl RenderingEngine {
    pub fn new(context: RenderContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Render `source` under `mode`, without caching or side effects
    pub fn render(&self, source: &RenderSource<'_>, mode: RenderMode) -> Result<RenderingResult> {
        let options = RenderOptions {
            mode,
            includes: self.context.includes.as_deref(),
            max_include_depth: self.context.max_include_depth,
        };
        self.context
            .markup
            .render(source, self.context.link_resolver.as_ref(), &options)
    }

    /// Bind the engine to a revision of `page`
    pub fn bind(&self, web: Web, page: Page, revision: Revision) -> Result<PageRenderer> {
        PageRenderer::new(self.clone(), web, page, revision)
    }
}

// =============================================================================
// Page Renderer
// =============================================================================

#[derive(Debug)]
pub struct PageRenderer {
    engine: RenderingEngine,
    web: Web,
    page: Page,
    revision: Revision,
    cache: RenderCache,
}

impl PageRenderer {
    pub fn new(engine: RenderingEngine, web: Web, page: Page, revision: Revision) -> Result<Self> {
        if page.web_id != web.id {
            return Err(WikiError::invalid(
                "page",
                format!("'{}' does not belong to web '{}'", page.name, web.address),
            ));
        }
        check_revision(&page, &revision)?;

        let cache = RenderCache::new(engine.context().cache_enabled);
        Ok(Self {
            engine,
            web,
            page,
            revision,
            cache,
        })
    }

    pub fn web(&self) -> &Web {
        &self.web
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    /// Rebind to another revision of the same page; drops every cached value
    pub fn set_revision(&mut self, revision: Revision) -> Result<()> {
        check_revision(&self.page, &revision)?;
        self.revision = revision;
        self.cache.invalidate();
        Ok(())
    }

    fn source(&self) -> RenderSource<'_> {
        RenderSource::new(&self.web, &self.page, &self.revision)
    }

    fn rendering(&self, mode: RenderMode) -> Result<Arc<RenderingResult>> {
        self.cache
            .rendering(mode, || self.engine.render(&self.source(), mode))
    }

    pub fn display_content(&self) -> Result<Arc<RenderingResult>> {
        self.rendering(RenderMode::Display)
    }

    pub fn display_published(&self) -> Result<Arc<RenderingResult>> {
        self.rendering(RenderMode::Publish)
    }

    /// Export rendering, computed fresh on every call so that inclusions
    /// reflect the latest included pages
    pub fn display_content_for_export(&self) -> Result<RenderingResult> {
        self.engine.render(&self.source(), RenderMode::Export)
    }

    /// Display rendering followed by a synchronization of the page's
    /// persisted references. A cached display result is reused; the
    /// synchronization always runs.
    pub fn display_content_updating_references(
        &self,
        store: &dyn ReferenceStore,
    ) -> Result<(Arc<RenderingResult>, SyncReport)> {
        let result = self.display_content()?;
        let report =
            ReferenceSynchronizer::new(store).synchronize(&self.web, &self.page, &result)?;
        Ok((result, report))
    }

    /// Word diff between the previous revision and this one, both in
    /// display mode. Without a predecessor this is the plain display HTML.
    pub fn display_diff(&self, history: &dyn RevisionHistory) -> Result<String> {
        let current = self.display_content()?;
        let Some(previous) = history.previous_revision(&self.revision)? else {
            return Ok(current.html().to_string());
        };
        check_revision(&self.page, &previous)?;

        let previous = self.engine.render(
            &RenderSource::new(&self.web, &self.page, &previous),
            RenderMode::Display,
        )?;
        Ok(self
            .engine
            .context()
            .differ
            .diff(previous.html(), current.html()))
    }

    pub fn wiki_words(&self) -> Result<Arc<Vec<String>>> {
        self.cache.names(NameSet::WikiWords, || {
            Ok(references::wiki_words(&*self.display_content()?))
        })
    }

    pub fn wiki_includes(&self) -> Result<Arc<Vec<String>>> {
        self.cache.names(NameSet::Includes, || {
            Ok(references::wiki_includes(&*self.display_content()?))
        })
    }

    pub fn wiki_references(&self) -> Result<Arc<Vec<String>>> {
        self.cache.names(NameSet::References, || {
            Ok(references::wiki_references(&*self.display_content()?))
        })
    }

    pub fn categories(&self) -> Result<Vec<String>> {
        Ok(references::categories(&*self.display_content()?))
    }

    pub fn existing_pages(&self, lookup: &dyn WebLookup) -> Result<Vec<String>> {
        references::existing_pages(&self.wiki_words()?, &self.web, lookup)
    }

    pub fn unexisting_pages(&self, lookup: &dyn WebLookup) -> Result<Vec<String>> {
        references::unexisting_pages(&self.wiki_words()?, &self.web, lookup)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn check_revision(page: &Page, revision: &Revision) -> Result<()> {
    if revision.page_id != page.id {
        return Err(WikiError::invalid(
            "revision",
            format!(
                "revision {} belongs to page {}, not '{}'",
                revision.id, revision.page_id, page.name
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::markup::{LinkResolver, MarkupEngine, PageIndex, UrlGenerator, WikiMarkup};
    use crate::test_support;

    const EXAMPLE: &str = r"HomePage [[SomePage]] \[[EscapedPage]] [[pic.jpg:pic]]";

    /// Counts calls into the bundled grammar
    #[derive(Default)]
    struct CountingMarkup {
        calls: AtomicUsize,
    }

    impl MarkupEngine for CountingMarkup {
        fn render(
            &self,
            source: &RenderSource<'_>,
            resolver: &dyn LinkResolver,
            options: &RenderOptions<'_>,
        ) -> Result<RenderingResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            WikiMarkup.render(source, resolver, options)
        }
    }

    struct Pages(Vec<&'static str>);

    impl WebLookup for Pages {
        fn page(&self, web: &Web, name: &str) -> Result<Option<Page>> {
            Ok(self
                .0
                .contains(&name)
                .then(|| test_support::page(9, web, name)))
        }
    }

    struct History(Vec<Revision>);

    impl RevisionHistory for History {
        fn previous_revision(&self, revision: &Revision) -> Result<Option<Revision>> {
            Ok(self
                .0
                .iter()
                .filter(|r| r.page_id == revision.page_id && r.number < revision.number)
                .max_by_key(|r| r.number)
                .cloned())
        }
    }

    fn engine(markup: Arc<dyn MarkupEngine>) -> RenderingEngine {
        let web = test_support::web(1, "wiki");
        let index: PageIndex = [(web.id, "HomePage")].into_iter().collect();
        let context = RenderContext::builder()
            .link_resolver(Arc::new(UrlGenerator::new("", index)))
            .markup(markup)
            .build()
            .unwrap();
        RenderingEngine::new(context)
    }

    fn renderer(markup: Arc<dyn MarkupEngine>, content: &str) -> PageRenderer {
        let web = test_support::web(1, "wiki");
        let page = test_support::page(1, &web, "HomePage");
        let revision = test_support::revision(1, &page, 1, content);
        engine(markup).bind(web, page, revision).unwrap()
    }

    #[test]
    fn test_renderer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderingEngine>();
        assert_send_sync::<PageRenderer>();
    }

    #[test]
    fn test_example_page_references() {
        let renderer = renderer(Arc::new(WikiMarkup), EXAMPLE);
        let lookup = Pages(vec!["HomePage"]);

        assert_eq!(renderer.wiki_words().unwrap().as_slice(), ["SomePage"]);
        assert!(renderer.existing_pages(&lookup).unwrap().is_empty());
        assert_eq!(renderer.unexisting_pages(&lookup).unwrap(), vec!["SomePage"]);
        assert_eq!(
            renderer.wiki_references().unwrap().as_slice(),
            ["SomePage", "pic.jpg"]
        );
        assert!(renderer.wiki_includes().unwrap().is_empty());
    }

    #[test]
    fn test_display_and_publish_cached_export_not() {
        let markup = Arc::new(CountingMarkup::default());
        let renderer = renderer(markup.clone(), EXAMPLE);

        let first = renderer.display_content().unwrap();
        let second = renderer.display_content().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let published = renderer.display_published().unwrap();
        assert!(Arc::ptr_eq(&published, &renderer.display_published().unwrap()));
        assert_eq!(published.mode(), RenderMode::Publish);
        assert_eq!(markup.calls.load(Ordering::SeqCst), 2);

        renderer.display_content_for_export().unwrap();
        renderer.display_content_for_export().unwrap();
        assert_eq!(markup.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_name_sets_reuse_display_rendering() {
        let markup = Arc::new(CountingMarkup::default());
        let renderer = renderer(markup.clone(), EXAMPLE);

        renderer.wiki_words().unwrap();
        renderer.wiki_words().unwrap();
        renderer.wiki_references().unwrap();
        renderer.display_content().unwrap();

        assert_eq!(markup.calls.load(Ordering::SeqCst), 1);
        assert!(renderer.cache_stats().hits >= 3);
    }

    #[test]
    fn test_set_revision_invalidates() {
        let mut renderer = renderer(Arc::new(WikiMarkup), "[[OldPage]]");
        assert_eq!(renderer.wiki_words().unwrap().as_slice(), ["OldPage"]);

        let next = test_support::revision(2, renderer.page(), 2, "[[NewPage]]");
        renderer.set_revision(next).unwrap();

        assert_eq!(renderer.wiki_words().unwrap().as_slice(), ["NewPage"]);
        assert!(renderer.display_content().unwrap().html().contains("NewPage"));
        assert_eq!(renderer.cache_stats().invalidations, 1);
    }

    #[test]
    fn test_set_revision_rejects_foreign_revision() {
        let mut renderer = renderer(Arc::new(WikiMarkup), "text");
        let web = test_support::web(1, "wiki");
        let other = test_support::page(2, &web, "OtherPage");
        let foreign = test_support::revision(5, &other, 1, "x");

        let err = renderer.set_revision(foreign).unwrap_err();
        assert!(matches!(err, WikiError::Invalid { field: "revision", .. }));
        assert_eq!(renderer.revision().number, 1);
    }

    #[test]
    fn test_diff_without_predecessor_is_display_content() {
        let renderer = renderer(Arc::new(WikiMarkup), EXAMPLE);
        let history = History(vec![renderer.revision().clone()]);

        assert_eq!(
            renderer.display_diff(&history).unwrap(),
            renderer.display_content().unwrap().html()
        );
    }

    #[test]
    fn test_diff_against_predecessor() {
        let mut renderer = renderer(Arc::new(WikiMarkup), "Hello world");
        let first = renderer.revision().clone();
        let second = test_support::revision(2, renderer.page(), 2, "Hello there");
        renderer.set_revision(second.clone()).unwrap();
        let history = History(vec![first, second]);

        assert_eq!(
            renderer.display_diff(&history).unwrap(),
            r#"<p>Hello <del class="diffmod">world</del><ins class="diffmod">there</ins></p>"#
        );
    }

    #[test]
    fn test_bind_rejects_page_from_other_web() {
        let web = test_support::web(1, "wiki");
        let other_web = test_support::web(2, "other");
        let page = test_support::page(1, &other_web, "HomePage");
        let revision = test_support::revision(1, &page, 1, "");

        assert!(engine(Arc::new(WikiMarkup)).bind(web, page, revision).is_err());
    }
}
