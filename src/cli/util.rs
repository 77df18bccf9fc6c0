//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::{Config, ConfigLoader};
use crate::markup::UrlGenerator;
use crate::render::{RenderContext, RenderingEngine};
use crate::storage::{Database, PoolConfig, WikiStore};
use crate::types::{Result, Web, WikiError};

/// Output format of listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Serialize `value` for the structured formats; `None` for text
    pub fn render<T: Serialize>(self, value: &T) -> Result<Option<String>> {
        match self {
            OutputFormat::Text => Ok(None),
            OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
            OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
        }
    }

    /// Print `value` in a structured format, or run `text` for plain output
    pub fn print<T: Serialize>(self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        match self.render(value)? {
            Some(out) => println!("{}", out.trim_end()),
            None => text(value),
        }
        Ok(())
    }
}

/// Command execution context
///
/// Provides unified access to common resources needed by CLI commands.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Project root directory
    pub root: PathBuf,
    /// Loaded configuration
    pub config: Config,
    /// Repository over the project database
    pub store: WikiStore,
}

impl CommandContext {
    /// Load full command context
    ///
    /// Validates initialization, loads config, and opens database.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let root = std::env::current_dir()?;
        Self::load_in(root, config_path)
    }

    pub fn load_in(root: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        require_initialized(&root)?;
        let config = ConfigLoader::load_in(&root, config_path)?;

        let db_path = database_path(&root, &config);
        if !db_path.exists() {
            return Err(WikiError::NotInitialized);
        }
        let db = open_database(&db_path, &config)?;

        Ok(Self {
            root,
            config,
            store: WikiStore::new(Arc::new(db)),
        })
    }

    /// Rendering engine resolving links against the current page set
    pub fn engine(&self) -> Result<RenderingEngine> {
        let resolver = UrlGenerator::new(&self.config.render.base_url, self.store.page_index()?);
        let context = RenderContext::builder()
            .config(&self.config.render)
            .link_resolver(Arc::new(resolver))
            .includes(Arc::new(self.store.clone()))
            .build()?;
        Ok(RenderingEngine::new(context))
    }

    /// Resolve a web address, falling back to `wiki.default_web`
    pub fn web(&self, address: Option<&str>) -> Result<Web> {
        let address = address.unwrap_or(&self.config.wiki.default_web);
        self.store.require_web(address)
    }
}

/// Require wikiloom to be initialized under `root`
///
/// Returns the `.wikiloom` directory path if initialized,
/// or `WikiError::NotInitialized` if not.
pub fn require_initialized(root: &Path) -> Result<PathBuf> {
    let dir = ConfigLoader::project_dir(root);

    if !dir.exists() {
        return Err(WikiError::NotInitialized);
    }

    Ok(dir)
}

/// Check if wikiloom is initialized under `root`
pub fn is_initialized(root: &Path) -> bool {
    ConfigLoader::is_project_initialized(root)
}

/// Configured database path, resolved against `root`
pub fn database_path(root: &Path, config: &Config) -> PathBuf {
    root.join(config.storage.database_path())
}

/// Open the database with the configured pool
pub fn open_database(path: &Path, config: &Config) -> Result<Database> {
    let db = Database::open_with_config(path, PoolConfig::from_config(&config.storage))?;
    db.initialize()?;
    Ok(db)
}

/// Create and initialize the project database
///
/// Creates the database directory if needed and initializes the schema.
pub fn create_database(root: &Path, config: &Config) -> Result<Database> {
    let db_path = database_path(root, config);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    open_database(&db_path, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn initialized() -> TempDir {
        let dir = TempDir::new().unwrap();
        ConfigLoader::init_project(dir.path(), false).unwrap();
        create_database(dir.path(), &Config::default()).unwrap();
        dir
    }

    #[test]
    fn test_load_requires_initialization() {
        let dir = TempDir::new().unwrap();
        let err = CommandContext::load_in(dir.path().to_path_buf(), None).unwrap_err();
        assert!(matches!(err, WikiError::NotInitialized));
        assert!(!is_initialized(dir.path()));
    }

    #[test]
    fn test_context_renders_with_store_links() {
        let dir = initialized();
        let ctx = CommandContext::load_in(dir.path().to_path_buf(), None).unwrap();
        let web = ctx
            .store
            .create_web("Wiki", "wiki", &Default::default())
            .unwrap();
        ctx.store.save_revision(&web, "OtherPage", "x", "Alice").unwrap();
        let (page, revision) = ctx
            .store
            .save_revision(&web, "HomePage", "See OtherPage", "Alice")
            .unwrap();

        let html = ctx
            .engine()
            .unwrap()
            .bind(ctx.web(None).unwrap(), page, revision)
            .unwrap()
            .display_content()
            .unwrap()
            .html()
            .to_string();

        assert!(html.contains("existingWikiWord"));
        assert!(html.contains("/wiki/show/OtherPage"));
    }

    #[test]
    fn test_output_format_render() {
        let value = serde_json::json!({ "pages": 2 });
        assert!(OutputFormat::Text.render(&value).unwrap().is_none());
        assert!(OutputFormat::Json.render(&value).unwrap().unwrap().contains("\"pages\": 2"));
        assert_eq!(
            OutputFormat::Yaml.render(&value).unwrap().unwrap().trim(),
            "pages: 2"
        );
    }
}
