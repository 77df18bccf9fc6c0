//! Page Command
//!
//! Save revisions, render them and inspect their references.
//!
//! Usage:
//!   wikiloom page save WEB PAGE [--file F] [--author A]
//!   wikiloom page show WEB PAGE [--mode display|export|publish] [--revision N]
//!   wikiloom page diff WEB PAGE [--revision N]
//!   wikiloom page refs WEB PAGE [-f json|yaml]

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat};
use crate::references::SyncReport;
use crate::render::PageRenderer;
use crate::types::{LinkType, Reference, RenderMode, Result, WikiError};

/// Store a new revision and synchronize the page's references.
///
/// Reads the content from `file`, or from stdin when none is given.
pub fn save(
    ctx: &CommandContext,
    web: &str,
    page: &str,
    file: Option<&Path>,
    author: Option<&str>,
) -> Result<SyncReport> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    save_content(ctx, web, page, &content, author)
}

pub fn save_content(
    ctx: &CommandContext,
    web: &str,
    page: &str,
    content: &str,
    author: Option<&str>,
) -> Result<SyncReport> {
    let web = ctx.web(Some(web))?;
    let author = author.unwrap_or(&ctx.config.wiki.default_author);

    let (page, revision) = ctx.store.save_revision(&web, page, content, author)?;
    let number = revision.number;

    // Built after saving so the new page resolves as existing
    let renderer = ctx.engine()?.bind(web, page, revision)?;
    let (_, report) = renderer.display_content_updating_references(&ctx.store)?;

    Output::new().success(&format!(
        "Saved {} revision {} ({} references)",
        renderer.page().name,
        number,
        report.total()
    ));
    Ok(report)
}

/// Render a revision (the latest by default) in `mode`
pub fn show(
    ctx: &CommandContext,
    web: &str,
    page: &str,
    mode: RenderMode,
    revision: Option<u32>,
) -> Result<String> {
    let renderer = renderer(ctx, web, page, revision)?;
    let html = match mode {
        RenderMode::Display => renderer.display_content()?.html().to_string(),
        RenderMode::Publish => renderer.display_published()?.html().to_string(),
        RenderMode::Export => renderer.display_content_for_export()?.into_html(),
    };
    Ok(html)
}

/// Word diff of a revision (the latest by default) against its predecessor
pub fn diff(ctx: &CommandContext, web: &str, page: &str, revision: Option<u32>) -> Result<String> {
    renderer(ctx, web, page, revision)?.display_diff(&ctx.store)
}

/// Links found in the latest revision next to the persisted reference graph
#[derive(Debug, Serialize)]
pub struct PageReferences {
    pub page: String,
    pub revision: u32,
    pub wiki_words: Vec<String>,
    pub existing_pages: Vec<String>,
    pub unexisting_pages: Vec<String>,
    pub includes: Vec<String>,
    pub categories: Vec<String>,
    pub references: Vec<Reference>,
    pub linked_from: Vec<String>,
    pub included_by: Vec<String>,
}

pub fn references(ctx: &CommandContext, web: &str, page: &str) -> Result<PageReferences> {
    let renderer = renderer(ctx, web, page, None)?;
    let web = renderer.web();
    let name = renderer.page().name.clone();

    Ok(PageReferences {
        revision: renderer.revision().number,
        wiki_words: renderer.wiki_words()?.to_vec(),
        existing_pages: renderer.existing_pages(&ctx.store)?,
        unexisting_pages: renderer.unexisting_pages(&ctx.store)?,
        includes: renderer.wiki_includes()?.to_vec(),
        categories: renderer.categories()?,
        references: ctx.store.references_of(renderer.page().id)?,
        linked_from: ctx.store.pages_that_link_to(web, &name)?,
        included_by: ctx.store.pages_that_include(web, &name)?,
        page: name,
    })
}

pub fn refs(ctx: &CommandContext, web: &str, page: &str, format: OutputFormat) -> Result<()> {
    let refs = references(ctx, web, page)?;

    format.print(&refs, |refs| {
        let output = Output::new();
        output.header(&format!("{} (revision {})", refs.page, refs.revision));

        output.section("Links");
        output.field("existing", list(&refs.existing_pages));
        output.field("wanted", list(&refs.unexisting_pages));
        output.field("includes", list(&refs.includes));
        output.field("categories", list(&refs.categories));

        output.section("Stored references");
        if refs.references.is_empty() {
            output.item("(none)", true);
        }
        for reference in &refs.references {
            output.item(
                &format!(
                    "{:<10} {}",
                    reference.link_type.to_string(),
                    reference.referenced_name
                ),
                reference.link_type == LinkType::LinkedUnexistingPage,
            );
        }

        output.section("Backlinks");
        output.field("linked from", list(&refs.linked_from));
        output.field("included by", list(&refs.included_by));
    })
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn renderer(
    ctx: &CommandContext,
    web: &str,
    page: &str,
    revision: Option<u32>,
) -> Result<PageRenderer> {
    let web = ctx.web(Some(web))?;
    let page = ctx.store.require_page(&web, page)?;

    let revision = match revision {
        Some(number) => ctx.store.revision(page.id, number)?.ok_or_else(|| {
            WikiError::not_found("Revision", format!("{} #{}", page.name, number))
        })?,
        None => ctx
            .store
            .latest_revision(page.id)?
            .ok_or_else(|| WikiError::not_found("Revision", &page.name))?,
    };

    ctx.engine()?.bind(web, page, revision)
}
