//! Reference Synchronizer
//!
//! Replaces the persisted reference set of a page with the references found
//! in a freshly rendered revision. The replacement is one unit of work:
//! either the old set survives untouched or the new set is complete.

use std::fmt;

use serde::Serialize;

use super::extract;
use crate::markup::RenderingResult;
use crate::types::{LinkType, NewReference, Page, Result, Web, WikiError};

/// Staged writes against one page's references
pub trait ReferenceCollection {
    /// Classify a link to `name` against the pages visible to this unit of work
    fn link_type(&self, web: &Web, name: &str) -> Result<LinkType>;

    /// Remove every reference of the page, returning how many were removed
    fn delete_all(&mut self) -> Result<usize>;

    fn build(&mut self, reference: &NewReference) -> Result<()>;
}

pub trait ReferenceStore {
    /// Classify a link to `name` by whether it exists in `web`
    fn link_type(&self, web: &Web, name: &str) -> Result<LinkType>;

    /// Run `unit` against the references of `page`. Changes are committed
    /// when it returns `Ok` and discarded otherwise.
    fn replace_references(
        &self,
        page: &Page,
        unit: &mut dyn FnMut(&mut dyn ReferenceCollection) -> Result<()>,
    ) -> Result<()>;
}

/// Counts per link type written by one synchronization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub page: String,
    pub removed: usize,
    pub linked: usize,
    pub wanted: usize,
    pub included: usize,
    pub categories: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.linked + self.wanted + self.included + self.categories
    }

    fn count(&mut self, link_type: LinkType) {
        match link_type {
            LinkType::LinkedPage => self.linked += 1,
            LinkType::LinkedUnexistingPage => self.wanted += 1,
            LinkType::IncludedPage => self.included += 1,
            LinkType::Category => self.categories += 1,
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} linked, {} wanted, {} included, {} categories (replaced {})",
            self.page, self.linked, self.wanted, self.included, self.categories, self.removed
        )
    }
}

pub struct ReferenceSynchronizer<'s> {
    store: &'s dyn ReferenceStore,
}

impl<'s> ReferenceSynchronizer<'s> {
    pub fn new(store: &'s dyn ReferenceStore) -> Self {
        Self { store }
    }

    /// References `result` would produce for `page`, classified against the
    /// store as it is now. Nothing is written.
    pub fn plan(&self, web: &Web, page: &Page, result: &RenderingResult) -> Result<Vec<NewReference>> {
        stage(page, result, |name| self.store.link_type(web, name))
    }

    /// Replace the persisted references of `page` with those of `result`.
    ///
    /// # Errors
    ///
    /// [`WikiError::Synchronization`] when classification or the replacement
    /// fails. Nothing is committed in that case and the call may be retried.
    pub fn synchronize(&self, web: &Web, page: &Page, result: &RenderingResult) -> Result<SyncReport> {
        let failed = |e: WikiError| match e {
            WikiError::Synchronization { .. } => e,
            other => WikiError::synchronization(&page.name, other.to_string()),
        };

        let mut staged = Vec::new();
        let mut report = SyncReport {
            page: page.name.clone(),
            ..SyncReport::default()
        };
        self.store
            .replace_references(page, &mut |references: &mut dyn ReferenceCollection| {
                // Pages created after rendering count as existing here
                staged = stage(page, result, |name| references.link_type(web, name))?;
                report.removed = references.delete_all()?;
                for reference in &staged {
                    references.build(reference)?;
                }
                Ok(())
            })
            .map_err(failed)?;

        for reference in &staged {
            report.count(reference.link_type);
        }

        tracing::info!(
            page = %page.name,
            revision = %result.revision_id(),
            removed = report.removed,
            linked = report.linked,
            wanted = report.wanted,
            included = report.included,
            categories = report.categories,
            "Synchronized references"
        );

        Ok(report)
    }
}

fn stage(
    page: &Page,
    result: &RenderingResult,
    mut classify: impl FnMut(&str) -> Result<LinkType>,
) -> Result<Vec<NewReference>> {
    let mut staged = Vec::new();

    for word in extract::wiki_words(result) {
        let link_type = if word == page.name {
            LinkType::LinkedPage
        } else {
            classify(&word)?
        };
        staged.push(NewReference::new(word, link_type));
    }
    for name in extract::wiki_includes(result) {
        staged.push(NewReference::new(name, LinkType::IncludedPage));
    }
    for name in extract::categories(result) {
        staged.push(NewReference::new(name, LinkType::Category));
    }

    Ok(staged)
}
