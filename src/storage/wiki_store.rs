//! Web, page and revision persistence.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{DatabaseStats, SharedDatabase};
use crate::markup::{IncludeSource, PageIndex, WebLookup};
use crate::render::RevisionHistory;
use crate::types::{
    LinkType, Page, PageId, Result, Revision, Web, WebId, WebSettings, WikiError,
    log_filter_error,
};

const WEB_COLUMNS: &str = "id, name, address, brackets_only, safe_mode, published, count_pages, \
                           allow_uploads, color, additional_style";
const PAGE_COLUMNS: &str = "id, web_id, name, created_at, updated_at";
const REVISION_COLUMNS: &str = "id, page_id, number, content, author, created_at";

/// Repository over a shared database.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct WikiStore {
    db: SharedDatabase,
}

impl WikiStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.db
    }

    // =========================================================================
    // Webs
    // =========================================================================

    pub fn create_web(&self, name: &str, address: &str, settings: &WebSettings) -> Result<Web> {
        Web::validate_address(address)?;
        if name.trim().is_empty() {
            return Err(WikiError::invalid("web name", "must not be empty"));
        }

        let conn = self.db.connection()?;
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM webs WHERE address = ?1)",
            params![address],
            |row| row.get(0),
        )?;
        if taken {
            return Err(WikiError::invalid(
                "web address",
                format!("'{}' is already in use", address),
            ));
        }

        conn.execute(
            "INSERT INTO webs (name, address, brackets_only, safe_mode, published, count_pages, \
             allow_uploads, color, additional_style) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                name,
                address,
                settings.brackets_only,
                settings.safe_mode,
                settings.published,
                settings.count_pages,
                settings.allow_uploads,
                settings.color,
                settings.additional_style,
            ],
        )?;

        let web = Web {
            id: WebId::new(conn.last_insert_rowid()),
            name: name.to_string(),
            address: address.to_string(),
            settings: settings.clone(),
        };
        tracing::info!(web = %web.address, "Created web");
        Ok(web)
    }

    pub fn update_web(&self, web: &Web) -> Result<()> {
        let settings = &web.settings;
        let updated = self.db.execute(
            "UPDATE webs SET name = ?2, brackets_only = ?3, safe_mode = ?4, published = ?5, \
             count_pages = ?6, allow_uploads = ?7, color = ?8, additional_style = ?9 WHERE id = ?1",
            &[
                &web.id,
                &web.name,
                &settings.brackets_only,
                &settings.safe_mode,
                &settings.published,
                &settings.count_pages,
                &settings.allow_uploads,
                &settings.color,
                &settings.additional_style,
            ],
        )?;
        if updated == 0 {
            return Err(WikiError::not_found("Web", &web.address));
        }
        Ok(())
    }

    pub fn web(&self, address: &str) -> Result<Option<Web>> {
        let conn = self.db.connection()?;
        let web = conn
            .query_row(
                &format!("SELECT {} FROM webs WHERE address = ?1", WEB_COLUMNS),
                params![address],
                row_to_web,
            )
            .optional()?;
        Ok(web)
    }

    pub fn require_web(&self, address: &str) -> Result<Web> {
        self.web(address)?
            .ok_or_else(|| WikiError::not_found("Web", address))
    }

    pub fn webs(&self) -> Result<Vec<Web>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM webs ORDER BY address",
            WEB_COLUMNS
        ))?;
        let webs = stmt
            .query_map([], row_to_web)?
            .filter_map(|r| log_filter_error(r, "reading web"))
            .collect();
        Ok(webs)
    }

    // =========================================================================
    // Pages
    // =========================================================================

    pub fn page(&self, web_id: WebId, name: &str) -> Result<Option<Page>> {
        let conn = self.db.connection()?;
        find_page(&conn, web_id, name)
    }

    pub fn require_page(&self, web: &Web, name: &str) -> Result<Page> {
        self.page(web.id, name)?
            .ok_or_else(|| WikiError::not_found("Page", format!("{}/{}", web.address, name)))
    }

    pub fn pages(&self, web_id: WebId) -> Result<Vec<Page>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pages WHERE web_id = ?1 ORDER BY name",
            PAGE_COLUMNS
        ))?;
        let pages = stmt
            .query_map(params![web_id], row_to_page)?
            .filter_map(|r| log_filter_error(r, "reading page"))
            .collect();
        Ok(pages)
    }

    /// Names of every page, grouped by web
    pub fn page_index(&self) -> Result<PageIndex> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare("SELECT web_id, name FROM pages")?;
        let index = stmt
            .query_map([], |row| Ok((row.get::<_, WebId>(0)?, row.get::<_, String>(1)?)))?
            .filter_map(|r| log_filter_error(r, "reading page index"))
            .collect();
        Ok(index)
    }

    // =========================================================================
    // Revisions
    // =========================================================================

    /// Append a revision to `page_name`, creating the page when needed.
    ///
    /// Creating a page turns every wanted-page reference to it in the same
    /// web into a linked-page reference.
    pub fn save_revision(
        &self,
        web: &Web,
        page_name: &str,
        content: &str,
        author: &str,
    ) -> Result<(Page, Revision)> {
        if page_name.trim().is_empty() {
            return Err(WikiError::invalid("page name", "must not be empty"));
        }
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        let (page, revision) = self.db.transaction(|conn| {
            let page = match find_page(conn, web.id, page_name)? {
                Some(mut page) => {
                    conn.execute(
                        "UPDATE pages SET updated_at = ?2 WHERE id = ?1",
                        params![page.id, stamp],
                    )?;
                    page.updated_at = now;
                    page
                }
                None => {
                    conn.execute(
                        "INSERT INTO pages (web_id, name, created_at, updated_at) \
                         VALUES (?1, ?2, ?3, ?3)",
                        params![web.id, page_name, stamp],
                    )?;
                    let page = Page {
                        id: PageId::new(conn.last_insert_rowid()),
                        web_id: web.id,
                        name: page_name.to_string(),
                        created_at: now,
                        updated_at: now,
                    };
                    promote_wanted(conn, &page)?;
                    page
                }
            };

            let number: u32 = conn.query_row(
                "SELECT COALESCE(MAX(number), 0) + 1 FROM revisions WHERE page_id = ?1",
                params![page.id],
                |row| row.get(0),
            )?;
            conn.execute(
                "INSERT INTO revisions (page_id, number, content, author, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![page.id, number, content, author, stamp],
            )?;
            let revision = Revision {
                id: conn.last_insert_rowid().into(),
                page_id: page.id,
                number,
                content: content.to_string(),
                author: author.to_string(),
                created_at: now,
            };
            Ok((page, revision))
        })?;

        tracing::info!(
            web = %web.address,
            page = %page.name,
            revision = revision.number,
            "Saved revision"
        );
        Ok((page, revision))
    }

    pub fn revision(&self, page_id: PageId, number: u32) -> Result<Option<Revision>> {
        let conn = self.db.connection()?;
        let revision = conn
            .query_row(
                &format!(
                    "SELECT {} FROM revisions WHERE page_id = ?1 AND number = ?2",
                    REVISION_COLUMNS
                ),
                params![page_id, number],
                row_to_revision,
            )
            .optional()?;
        Ok(revision)
    }

    pub fn latest_revision(&self, page_id: PageId) -> Result<Option<Revision>> {
        let conn = self.db.connection()?;
        latest_revision(&conn, page_id)
    }

    pub fn revisions(&self, page_id: PageId) -> Result<Vec<Revision>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM revisions WHERE page_id = ?1 ORDER BY number",
            REVISION_COLUMNS
        ))?;
        let revisions = stmt
            .query_map(params![page_id], row_to_revision)?
            .filter_map(|r| log_filter_error(r, "reading revision"))
            .collect();
        Ok(revisions)
    }

    pub fn stats(&self) -> Result<DatabaseStats> {
        self.db.stats()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl WebLookup for WikiStore {
    fn page(&self, web: &Web, name: &str) -> Result<Option<Page>> {
        WikiStore::page(self, web.id, name)
    }
}

impl IncludeSource for WikiStore {
    fn included_content(&self, web: &Web, page_name: &str) -> Result<Option<String>> {
        let conn = self.db.connection()?;
        let Some(page) = find_page(&conn, web.id, page_name)? else {
            return Ok(None);
        };
        Ok(latest_revision(&conn, page.id)?.map(|revision| revision.content))
    }
}

impl RevisionHistory for WikiStore {
    fn previous_revision(&self, revision: &Revision) -> Result<Option<Revision>> {
        let conn = self.db.connection()?;
        let previous = conn
            .query_row(
                &format!(
                    "SELECT {} FROM revisions WHERE page_id = ?1 AND number < ?2 \
                     ORDER BY number DESC LIMIT 1",
                    REVISION_COLUMNS
                ),
                params![revision.page_id, revision.number],
                row_to_revision,
            )
            .optional()?;
        Ok(previous)
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

pub(super) fn find_page(conn: &Connection, web_id: WebId, name: &str) -> Result<Option<Page>> {
    let page = conn
        .query_row(
            &format!(
                "SELECT {} FROM pages WHERE web_id = ?1 AND name = ?2",
                PAGE_COLUMNS
            ),
            params![web_id, name],
            row_to_page,
        )
        .optional()?;
    Ok(page)
}

fn latest_revision(conn: &Connection, page_id: PageId) -> Result<Option<Revision>> {
    let revision = conn
        .query_row(
            &format!(
                "SELECT {} FROM revisions WHERE page_id = ?1 ORDER BY number DESC LIMIT 1",
                REVISION_COLUMNS
            ),
            params![page_id],
            row_to_revision,
        )
        .optional()?;
    Ok(revision)
}

/// Rewrite wanted-page references to a page that now exists
fn promote_wanted(conn: &Connection, page: &Page) -> Result<usize> {
    let promoted = conn.execute(
        "UPDATE OR IGNORE wiki_references SET link_type = ?1 \
         WHERE link_type = ?2 AND referenced_name = ?3 \
         AND page_id IN (SELECT id FROM pages WHERE web_id = ?4)",
        params![
            LinkType::LinkedPage.code(),
            LinkType::LinkedUnexistingPage.code(),
            page.name,
            page.web_id,
        ],
    )?;
    if promoted > 0 {
        tracing::debug!(page = %page.name, promoted, "Promoted wanted references");
    }
    Ok(promoted)
}

fn row_to_web(row: &Row<'_>) -> rusqlite::Result<Web> {
    Ok(Web {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        settings: WebSettings {
            brackets_only: row.get(3)?,
            safe_mode: row.get(4)?,
            published: row.get(5)?,
            count_pages: row.get(6)?,
            allow_uploads: row.get(7)?,
            color: row.get(8)?,
            additional_style: row.get(9)?,
        },
    })
}

fn row_to_page(row: &Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        web_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_timestamp(&row.get::<_, String>(3)?),
        updated_at: parse_timestamp(&row.get::<_, String>(4)?),
    })
}

fn row_to_revision(row: &Row<'_>) -> rusqlite::Result<Revision> {
    Ok(Revision {
        id: row.get(0)?,
        page_id: row.get(1)?,
        number: row.get(2)?,
        content: row.get(3)?,
        author: row.get(4)?,
        created_at: parse_timestamp(&row.get::<_, String>(5)?),
    })
}

pub(super) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::warn!("Invalid timestamp '{}': {}", value, e);
            DateTime::<Utc>::UNIX_EPOCH
        })
}
