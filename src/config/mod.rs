//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (XDG config dir)
//! 3. Project config (.wikiloom/config.toml) or `--config FILE`
//! 4. Environment variables (WIKILOOM_*)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
