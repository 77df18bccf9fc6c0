//! Reference persistence and reference-graph queries.

use std::collections::BTreeMap;

use rusqlite::{Connection, params};
use serde::Serialize;

use super::WikiStore;
use super::wiki_store::find_page;
use crate::references::{ReferenceCollection, ReferenceStore};
use crate::types::{
    LinkType, NewReference, Page, PageId, ParseWithDefault, Reference, Result, Web, WebId,
    log_filter_error,
};

/// Entry page of a web, never reported as orphaned
const HOME_PAGE: &str = "HomePage";

/// A name linked to but never written, with the pages asking for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WantedPage {
    pub name: String,
    pub wanted_by: Vec<String>,
}

/// Reference rows of one page inside an open transaction
struct TransactionReferences<'c> {
    conn: &'c Connection,
    page_id: PageId,
}

impl ReferenceCollection for TransactionReferences<'_> {
    fn link_type(&self, web: &Web, name: &str) -> Result<LinkType> {
        Ok(LinkType::for_link(find_page(self.conn, web.id, name)?.is_some()))
    }

    fn delete_all(&mut self) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM wiki_references WHERE page_id = ?1",
            params![self.page_id],
        )?;
        Ok(removed)
    }

    fn build(&mut self, reference: &NewReference) -> Result<()> {
        self.conn.execute(
            "INSERT INTO wiki_references (page_id, referenced_name, link_type) VALUES (?1, ?2, ?3)",
            params![
                self.page_id,
                reference.referenced_name,
                reference.link_type.code()
            ],
        )?;
        Ok(())
    }
}

impl ReferenceStore for WikiStore {
    fn link_type(&self, web: &Web, name: &str) -> Result<LinkType> {
        Ok(LinkType::for_link(self.page(web.id, name)?.is_some()))
    }

    fn replace_references(
        &self,
        page: &Page,
        unit: &mut dyn FnMut(&mut dyn ReferenceCollection) -> Result<()>,
    ) -> Result<()> {
        self.database().transaction(|conn| {
            let mut references = TransactionReferences {
                conn,
                page_id: page.id,
            };
            unit(&mut references)
        })
    }
}

// =============================================================================
// Queries
// =============================================================================

impl WikiStore {
    /// Persisted outgoing references of a page
    pub fn references_of(&self, page_id: PageId) -> Result<Vec<Reference>> {
        let conn = self.database().connection()?;
        let mut stmt = conn.prepare(
            "SELECT page_id, referenced_name, link_type FROM wiki_references \
             WHERE page_id = ?1 ORDER BY link_type, referenced_name",
        )?;
        let references = stmt
            .query_map(params![page_id], |row| {
                Ok(Reference {
                    page_id: row.get(0)?,
                    referenced_name: row.get(1)?,
                    link_type: LinkType::parse_or_default(&row.get::<_, String>(2)?),
                })
            })?
            .filter_map(|r| log_filter_error(r, "reading reference"))
            .collect();
        Ok(references)
    }

    /// Names of pages in `web` holding a reference of one of `types` to `name`
    fn referencing_pages(&self, web_id: WebId, name: &str, types: &[LinkType]) -> Result<Vec<String>> {
        let codes: Vec<String> = types.iter().map(|t| format!("'{}'", t.code())).collect();
        let conn = self.database().connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT p.name FROM wiki_references r \
             JOIN pages p ON p.id = r.page_id \
             WHERE p.web_id = ?1 AND r.referenced_name = ?2 AND r.link_type IN ({}) \
             ORDER BY p.name",
            codes.join(", ")
        ))?;
        let names = stmt
            .query_map(params![web_id, name], |row| row.get(0))?
            .filter_map(|r| log_filter_error(r, "reading referencing page"))
            .collect();
        Ok(names)
    }

    /// Pages that link to or include `name`
    pub fn pages_that_reference(&self, web: &Web, name: &str) -> Result<Vec<String>> {
        self.referencing_pages(
            web.id,
            name,
            &[
                LinkType::LinkedPage,
                LinkType::LinkedUnexistingPage,
                LinkType::IncludedPage,
            ],
        )
    }

    pub fn pages_that_link_to(&self, web: &Web, name: &str) -> Result<Vec<String>> {
        self.referencing_pages(
            web.id,
            name,
            &[LinkType::LinkedPage, LinkType::LinkedUnexistingPage],
        )
    }

    pub fn pages_that_include(&self, web: &Web, name: &str) -> Result<Vec<String>> {
        self.referencing_pages(web.id, name, &[LinkType::IncludedPage])
    }

    pub fn pages_in_category(&self, web: &Web, category: &str) -> Result<Vec<String>> {
        self.referencing_pages(web.id, category, &[LinkType::Category])
    }

    /// Every category used in `web`
    pub fn categories(&self, web: &Web) -> Result<Vec<String>> {
        let conn = self.database().connection()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT r.referenced_name FROM wiki_references r \
             JOIN pages p ON p.id = r.page_id \
             WHERE p.web_id = ?1 AND r.link_type = ?2 ORDER BY r.referenced_name",
        )?;
        let names = stmt
            .query_map(params![web.id, LinkType::Category.code()], |row| row.get(0))?
            .filter_map(|r| log_filter_error(r, "reading category"))
            .collect();
        Ok(names)
    }

    /// Linked names in `web` that have no page yet
    pub fn wanted_pages(&self, web: &Web) -> Result<Vec<WantedPage>> {
        let conn = self.database().connection()?;
        let mut stmt = conn.prepare(
            "SELECT r.referenced_name, p.name FROM wiki_references r \
             JOIN pages p ON p.id = r.page_id \
             WHERE p.web_id = ?1 AND r.link_type IN (?2, ?3) \
             AND NOT EXISTS (SELECT 1 FROM pages t WHERE t.web_id = ?1 AND t.name = r.referenced_name) \
             ORDER BY r.referenced_name, p.name",
        )?;
        let rows = stmt
            .query_map(
                params![
                    web.id,
                    LinkType::LinkedPage.code(),
                    LinkType::LinkedUnexistingPage.code()
                ],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )?
            .filter_map(|r| log_filter_error(r, "reading wanted page"));

        let mut wanted: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, referrer) in rows {
            let referrers = wanted.entry(name).or_default();
            if !referrers.contains(&referrer) {
                referrers.push(referrer);
            }
        }
        Ok(wanted
            .into_iter()
            .map(|(name, wanted_by)| WantedPage { name, wanted_by })
            .collect())
    }

    /// Pages of `web` that no other page links to or includes
    pub fn orphaned_pages(&self, web: &Web) -> Result<Vec<String>> {
        let conn = self.database().connection()?;
        let mut stmt = conn.prepare(
            "SELECT p.name FROM pages p WHERE p.web_id = ?1 AND p.name != ?2 \
             AND NOT EXISTS (
                 SELECT 1 FROM wiki_references r JOIN pages s ON s.id = r.page_id
                 WHERE s.web_id = ?1 AND s.id != p.id AND r.referenced_name = p.name
                 AND r.link_type IN (?3, ?4, ?5)
             ) ORDER BY p.name",
        )?;
        let names = stmt
            .query_map(
                params![
                    web.id,
                    HOME_PAGE,
                    LinkType::LinkedPage.code(),
                    LinkType::LinkedUnexistingPage.code(),
                    LinkType::IncludedPage.code()
                ],
                |row| row.get(0),
            )?
            .filter_map(|r| log_filter_error(r, "reading orphaned page"))
            .collect();
        Ok(names)
    }
}
