//! Web Command
//!
//! Administer webs and inspect their reference graph.
//!
//! Usage:
//!   wikiloom web create --name NAME --address ADDR [settings]
//!   wikiloom web update ADDR [settings]
//!   wikiloom web list [-f json|yaml]
//!   wikiloom web wanted|orphans|categories ADDR [-f json|yaml]

use serde::Serialize;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat};
use crate::types::{Result, Web, WebSettings, WikiError};

/// Web settings given on the command line; unset fields keep their value
#[derive(Debug, Clone, Default, clap::Args)]
pub struct WebOptions {
    #[arg(long, help = "Link only [[bracketed]] names, not bare CamelCase")]
    pub brackets_only: Option<bool>,
    #[arg(long)]
    pub safe_mode: Option<bool>,
    #[arg(long)]
    pub published: Option<bool>,
    #[arg(long)]
    pub count_pages: Option<bool>,
    #[arg(long)]
    pub allow_uploads: Option<bool>,
    #[arg(long, help = "Theme color as hex, e.g. 008B26")]
    pub color: Option<String>,
    #[arg(long = "style", help = "Additional CSS for the web")]
    pub additional_style: Option<String>,
}

impl WebOptions {
    pub fn apply(&self, settings: &mut WebSettings) -> Result<()> {
        if let Some(color) = &self.color {
            let hex = color.trim_start_matches('#');
            if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(WikiError::invalid(
                    "color",
                    format!("'{}' is not a hex color", color),
                ));
            }
            settings.color = hex.to_uppercase();
        }
        if let Some(value) = self.brackets_only {
            settings.brackets_only = value;
        }
        if let Some(value) = self.safe_mode {
            settings.safe_mode = value;
        }
        if let Some(value) = self.published {
            settings.published = value;
        }
        if let Some(value) = self.count_pages {
            settings.count_pages = value;
        }
        if let Some(value) = self.allow_uploads {
            settings.allow_uploads = value;
        }
        if let Some(style) = &self.additional_style {
            settings.additional_style = (!style.is_empty()).then(|| style.clone());
        }
        Ok(())
    }
}

pub fn create(ctx: &CommandContext, name: &str, address: &str, options: &WebOptions) -> Result<Web> {
    let mut settings = WebSettings::default();
    options.apply(&mut settings)?;

    let web = ctx.store.create_web(name, address, &settings)?;
    Output::new().success(&format!("Created web '{}' ({})", web.name, web.address));
    Ok(web)
}

pub fn update(
    ctx: &CommandContext,
    address: &str,
    name: Option<&str>,
    options: &WebOptions,
) -> Result<Web> {
    let mut web = ctx.store.require_web(address)?;
    if let Some(name) = name {
        web.name = name.to_string();
    }
    options.apply(&mut web.settings)?;

    ctx.store.update_web(&web)?;
    tracing::info!(web = %web.address, "Updated web settings");
    Output::new().success(&format!("Updated web '{}'", web.address));
    Ok(web)
}

#[derive(Debug, Serialize)]
struct WebSummary {
    #[serde(flatten)]
    web: Web,
    pages: usize,
}

pub fn list(ctx: &CommandContext, format: OutputFormat) -> Result<()> {
    let summaries = ctx
        .store
        .webs()?
        .into_iter()
        .map(|web| {
            let pages = ctx.store.pages(web.id)?.len();
            Ok(WebSummary { web, pages })
        })
        .collect::<Result<Vec<_>>>()?;

    format.print(&summaries, |summaries| {
        let output = Output::new();
        output.section("Webs");
        if summaries.is_empty() {
            output.item("(none)", true);
        }
        for summary in summaries {
            let flags = if summary.web.settings.brackets_only {
                " [brackets only]"
            } else {
                ""
            };
            output.item(
                &format!(
                    "{:<16} {} ({} pages){}",
                    summary.web.address, summary.web.name, summary.pages, flags
                ),
                false,
            );
        }
    })
}

pub fn wanted(ctx: &CommandContext, address: Option<&str>, format: OutputFormat) -> Result<()> {
    let web = ctx.web(address)?;
    let wanted = ctx.store.wanted_pages(&web)?;

    format.print(&wanted, |wanted| {
        let output = Output::new();
        output.section(&format!("Wanted pages in {}", web.address));
        if wanted.is_empty() {
            output.item("(none)", true);
        }
        for page in wanted {
            output.item(
                &format!("{:<24} wanted by {}", page.name, page.wanted_by.join(", ")),
                false,
            );
        }
    })
}

pub fn orphans(ctx: &CommandContext, address: Option<&str>, format: OutputFormat) -> Result<()> {
    let web = ctx.web(address)?;
    let orphans = ctx.store.orphaned_pages(&web)?;
    print_names(&format!("Orphaned pages in {}", web.address), &orphans, format)
}

pub fn categories(ctx: &CommandContext, address: Option<&str>, format: OutputFormat) -> Result<()> {
    let web = ctx.web(address)?;

    #[derive(Serialize)]
    struct CategoryPages {
        category: String,
        pages: Vec<String>,
    }

    let categories = ctx
        .store
        .categories(&web)?
        .into_iter()
        .map(|category| {
            let pages = ctx.store.pages_in_category(&web, &category)?;
            Ok(CategoryPages { category, pages })
        })
        .collect::<Result<Vec<_>>>()?;

    format.print(&categories, |categories| {
        let output = Output::new();
        output.section(&format!("Categories in {}", web.address));
        if categories.is_empty() {
            output.item("(none)", true);
        }
        for entry in categories {
            output.item(
                &format!("{:<16} {}", entry.category, entry.pages.join(", ")),
                false,
            );
        }
    })
}

fn print_names(title: &str, names: &[String], format: OutputFormat) -> Result<()> {
    format.print(&names, |names| {
        let output = Output::new();
        output.section(title);
        if names.is_empty() {
            output.item("(none)", true);
        }
        for name in names.iter() {
            output.item(name, false);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_given_fields() {
        let mut settings = WebSettings::default();
        let options = WebOptions {
            brackets_only: Some(true),
            color: Some("#abc".to_string()),
            ..WebOptions::default()
        };

        options.apply(&mut settings).unwrap();

        assert!(settings.brackets_only);
        assert_eq!(settings.color, "ABC");
        assert!(settings.allow_uploads);
    }

    #[test]
    fn test_apply_rejects_bad_color() {
        let options = WebOptions {
            color: Some("green".to_string()),
            ..WebOptions::default()
        };
        assert!(options.apply(&mut WebSettings::default()).is_err());
    }

    #[test]
    fn test_empty_style_clears_it() {
        let mut settings = WebSettings {
            additional_style: Some("body {}".to_string()),
            ..WebSettings::default()
        };
        let options = WebOptions {
            additional_style: Some(String::new()),
            ..WebOptions::default()
        };

        options.apply(&mut settings).unwrap();
        assert!(settings.additional_style.is_none());
    }
}
