//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (XDG config dir) and project (.wikiloom/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{database, paths, render, wiki};
use crate::types::{Result, WikiError};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Database settings
    pub storage: StorageConfig,

    /// Rendering settings
    pub render: RenderConfig,

    /// Defaults for wiki commands
    pub wiki: WikiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            render: RenderConfig::default(),
            wiki: WikiConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `WikiError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.render.max_include_depth > render::MAX_INCLUDE_DEPTH_LIMIT {
            return Err(WikiError::Config(format!(
                "render.max_include_depth must be at most {}, got {}",
                render::MAX_INCLUDE_DEPTH_LIMIT,
                self.render.max_include_depth
            )));
        }

        if self.storage.pool_max_size == 0 {
            return Err(WikiError::Config(
                "storage.pool_max_size must be greater than 0".to_string(),
            ));
        }

        if self.storage.connection_timeout_secs == 0 {
            return Err(WikiError::Config(
                "storage.connection_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let base_url = self.render.base_url.as_str();
        if !base_url.is_empty() && !base_url.starts_with('/') && url::Url::parse(base_url).is_err()
        {
            return Err(WikiError::Config(format!(
                "render.base_url must be empty, an absolute path or a URL, got '{}'",
                base_url
            )));
        }

        if self.wiki.default_author.trim().is_empty() {
            return Err(WikiError::Config(
                "wiki.default_author must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file, relative to the working directory
    pub database_path: PathBuf,

    /// Maximum pooled connections
    pub pool_max_size: u32,

    /// Seconds to wait for a pooled connection
    pub connection_timeout_secs: u64,
}

impl StorageConfig {
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(paths::DATABASE_PATH),
            pool_max_size: database::DEFAULT_POOL_SIZE,
            connection_timeout_secs: database::DEFAULT_CONNECTION_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Render Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Prefix of generated links; empty for root-relative links
    pub base_url: String,

    /// Nesting limit for `[[!include ...]]`
    pub max_include_depth: usize,

    /// Memoize display and publish renderings per revision
    pub cache_enabled: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_include_depth: render::MAX_INCLUDE_DEPTH,
            cache_enabled: true,
        }
    }
}

// =============================================================================
// Wiki Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// Web address used when a command names none
    pub default_web: String,

    /// Author recorded on saved revisions
    pub default_author: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            default_web: wiki::DEFAULT_WEB.to_string(),
            default_author: wiki::DEFAULT_AUTHOR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.render.max_include_depth, 3);
        assert!(config.render.cache_enabled);
        assert_eq!(config.wiki.default_author, "AnonymousCoward");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_include_depth() {
        let mut config = Config::default();
        config.render.max_include_depth = 16;
        assert!(config.validate().is_ok());

        config.render.max_include_depth = 17;
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("max_include_depth"));
    }

    #[test]
    fn test_validate_storage() {
        let mut config = Config::default();
        config.storage.pool_max_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.connection_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        for ok in ["", "/wiki", "https://wiki.example.com/"] {
            config.render.base_url = ok.to_string();
            assert!(config.validate().is_ok(), "{} should be accepted", ok);
        }

        config.render.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[render]\nbase_url = \"/w\"\n").unwrap();
        assert_eq!(config.render.base_url, "/w");
        assert_eq!(config.render.max_include_depth, 3);
        assert_eq!(config.storage, StorageConfig::default());
    }
}
