//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (`<XDG config dir>/wikiloom/config.toml`)
//! 3. Project config (`.wikiloom/config.toml`), or the file given by `--config`
//! 4. Environment variables (`WIKILOOM_` prefix, sections split on `__`)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants::paths;
use crate::types::{Result, WikiError};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project (or `explicit`) → env vars
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        Self::load_in(Path::new("."), explicit)
    }

    /// Same as [`ConfigLoader::load`] with the project rooted at `root`
    pub fn load_in(root: &Path, explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(WikiError::Config(format!(
                        "Config file does not exist: {}",
                        path.display()
                    )));
                }
                debug!("Loading config from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let project_path = Self::project_config_path(root);
                if project_path.exists() {
                    debug!("Loading project config from: {}", project_path.display());
                    figment = figment.merge(Toml::file(&project_path));
                }
            }
        }

        // e.g. WIKILOOM_RENDER__BASE_URL -> render.base_url
        figment = figment.merge(Env::prefixed(paths::ENV_PREFIX).split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| WikiError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| WikiError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "wikiloom").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(paths::CONFIG_FILE))
    }

    /// Get project data directory
    pub fn project_dir(root: &Path) -> PathBuf {
        root.join(paths::PROJECT_DIR)
    }

    /// Get path to project config file
    pub fn project_config_path(root: &Path) -> PathBuf {
        Self::project_dir(root).join(paths::CONFIG_FILE)
    }

    /// Check if project is initialized
    pub fn is_project_initialized(root: &Path) -> bool {
        Self::project_dir(root).exists()
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path(root: &Path) {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path(root);
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration
    pub fn show_config(explicit: Option<&Path>, as_json: bool) -> Result<()> {
        let config = Self::load(explicit)?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!("{}", Self::to_toml(&config)?);
        }

        Ok(())
    }

    pub fn to_toml(config: &Config) -> Result<String> {
        toml::to_string_pretty(config).map_err(|e| WikiError::Config(e.to_string()))
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            WikiError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join(paths::CONFIG_FILE);
        Self::write_config(&config_path, &Self::default_global_config(), force)?;
        Ok(global_dir)
    }

    /// Initialize project directory and configuration
    pub fn init_project(root: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir(root);
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join(paths::CONFIG_FILE);
        Self::write_config(&config_path, &Self::default_project_config(), force)?;
        Ok(project_dir)
    }

    fn write_config(path: &Path, content: &str, force: bool) -> Result<()> {
        if !path.exists() || force {
            fs::write(path, content)?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default global config content (TOML)
    fn default_global_config() -> String {
        r#"# wikiloom Global Configuration
# User-wide defaults. Project settings in .wikiloom/config.toml override these.

version = "1.0"

[wiki]
default_author = "AnonymousCoward"
"#
        .to_string()
    }

    /// Generate default project config content (TOML)
    fn default_project_config() -> String {
        r#"# wikiloom Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[storage]
database_path = ".wikiloom/wiki.db"

# Rendering
[render]
# Prefix of generated links, e.g. "https://wiki.example.com"
base_url = ""
max_include_depth = 3
cache_enabled = true

[wiki]
default_web = "wiki"
"#
        .to_string()
    }
}
