//! Status Command
//!
//! Display wikiloom project status.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, database_path, is_initialized};
use crate::storage::DatabaseStats;
use crate::types::Result;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    NotInitialized,
    Initialized {
        database: PathBuf,
        base_url: String,
        default_web: String,
        stats: DatabaseStats,
        webs: Vec<WebStatus>,
    },
}

#[derive(Debug, Serialize)]
pub struct WebStatus {
    pub address: String,
    pub pages: usize,
    pub wanted: usize,
}

pub fn run(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let root = std::env::current_dir()?;
    let status = collect(root, config_path)?;
    format.print(&status, print_text)
}

pub fn collect(root: PathBuf, config_path: Option<&Path>) -> Result<Status> {
    if !is_initialized(&root) {
        return Ok(Status::NotInitialized);
    }

    let ctx = CommandContext::load_in(root, config_path)?;
    let webs = ctx
        .store
        .webs()?
        .into_iter()
        .map(|web| {
            Ok(WebStatus {
                pages: ctx.store.pages(web.id)?.len(),
                wanted: ctx.store.wanted_pages(&web)?.len(),
                address: web.address,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Status::Initialized {
        database: database_path(&ctx.root, &ctx.config),
        base_url: ctx.config.render.base_url.clone(),
        default_web: ctx.config.wiki.default_web.clone(),
        stats: ctx.store.stats()?,
        webs,
    })
}

fn print_text(status: &Status) {
    let output = Output::new();
    output.header("wikiloom Status");

    let Status::Initialized {
        database,
        base_url,
        default_web,
        stats,
        webs,
    } = status
    else {
        output.warning("Not initialized. Run 'wikiloom init' first.");
        return;
    };

    output.field("Database", database.display());
    output.field("Schema", stats.schema_version);
    output.field(
        "Base URL",
        if base_url.is_empty() {
            "(relative)"
        } else {
            base_url.as_str()
        },
    );
    output.field("Default web", default_web);

    output.section("Contents");
    output.field("Webs", stats.webs);
    output.field("Pages", stats.pages);
    output.field("Revisions", stats.revisions);
    output.field("References", stats.references);

    if !webs.is_empty() {
        output.section("Webs");
        for web in webs {
            output.item(
                &format!(
                    "{:<16} {} pages, {} wanted",
                    web.address, web.pages, web.wanted
                ),
                web.pages == 0,
            );
        }
    }
}
