//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Project layout
pub mod paths {
    /// Project data directory, relative to the working directory
    pub const PROJECT_DIR: &str = ".wikiloom";

    /// Config file name inside the project and global directories
    pub const CONFIG_FILE: &str = "config.toml";

    /// Default database location
    pub const DATABASE_PATH: &str = ".wikiloom/wiki.db";

    /// Environment variable prefix for config overrides
    pub const ENV_PREFIX: &str = "WIKILOOM_";
}

/// Rendering constants
pub mod render {
    /// Default nesting limit for page inclusions
    pub const MAX_INCLUDE_DEPTH: usize = 3;

    /// Hard upper bound accepted for `render.max_include_depth`
    pub const MAX_INCLUDE_DEPTH_LIMIT: usize = 16;
}

/// Wiki defaults
pub mod wiki {
    /// Address of the web created by `init` when none is given
    pub const DEFAULT_WEB: &str = "wiki";

    /// Author recorded for revisions saved without one
    pub const DEFAULT_AUTHOR: &str = "AnonymousCoward";

    /// Default theme color of a new web
    pub const DEFAULT_COLOR: &str = "008B26";
}

/// Database constants
pub mod database {
    /// Default maximum number of pooled connections
    pub const DEFAULT_POOL_SIZE: u32 = 4;

    /// Default seconds to wait for a pooled connection
    pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// SQLite busy timeout (milliseconds)
    pub const BUSY_TIMEOUT_MS: u64 = 5000;
}
