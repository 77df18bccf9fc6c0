//! Config Command
//!
//! Manage wikiloom configuration.
//!
//! Usage:
//!   wikiloom config show [-g] [--json]
//!   wikiloom config path
//!   wikiloom config init [-g] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(config_path: Option<&Path>, global: bool, as_json: bool) -> Result<()> {
    if !global {
        // Merged effective config
        return ConfigLoader::show_config(config_path, as_json);
    }

    let output = Output::new();
    match ConfigLoader::global_config_path() {
        Some(global_path) if global_path.exists() => {
            let content = std::fs::read_to_string(&global_path)?;
            println!("# Global Config: {}\n", global_path.display());
            println!("{}", content);
        }
        Some(_) => {
            output.info("No global config found.");
            println!("Run 'wikiloom config init --global' to create one.");
        }
        None => output.warning("Cannot determine global config directory."),
    }
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    let root = std::env::current_dir()?;
    ConfigLoader::show_path(&root);
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    Output::new().success("Initialized global configuration");
    println!("  Directory: {}", dir.display());
    if let Some(config_path) = ConfigLoader::global_config_path() {
        println!("  Config:    {}", config_path.display());
    }
    Ok(())
}

/// Initialize project configuration
pub fn init_project(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;

    let dir = ConfigLoader::init_project(&root, force)?;
    Output::new().success("Initialized project configuration");
    println!("  Directory: {}", dir.display());
    println!(
        "  Config:    {}",
        ConfigLoader::project_config_path(&root).display()
    );
    Ok(())
}
