//! Init Command
//!
//! Initialize wikiloom in the current directory.

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{create_database, is_initialized};
use crate::config::ConfigLoader;
use crate::storage::WikiStore;
use crate::types::{Result, WebSettings, WikiError};

/// First web to create during initialization
#[derive(Debug, Clone)]
pub struct InitialWeb {
    pub name: String,
    pub address: String,
}

pub fn run(force: bool, web: Option<InitialWeb>) -> Result<()> {
    let root = std::env::current_dir()?;
    run_in(&root, force, web)
}

pub fn run_in(root: &Path, force: bool, web: Option<InitialWeb>) -> Result<()> {
    if is_initialized(root) && !force {
        return Err(WikiError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    let project_dir = ConfigLoader::init_project(root, force)?;

    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    let config = ConfigLoader::load_in(root, None)?;
    let db = create_database(root, &config)?;
    let store = WikiStore::new(std::sync::Arc::new(db));

    let output = Output::new();
    output.success(&format!("Initialized wikiloom in {}", project_dir.display()));

    if let Some(web) = web {
        if store.web(&web.address)?.is_some() {
            output.info(&format!("Web '{}' already exists", web.address));
        } else {
            store.create_web(&web.name, &web.address, &WebSettings::default())?;
            output.success(&format!("Created web '{}' ({})", web.name, web.address));
        }
    }

    println!();
    println!("Next steps:");
    println!("  wikiloom web create --name Wiki --address wiki");
    println!("  wikiloom page save wiki HomePage --file home.txt");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::util::CommandContext;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_database_and_web() {
        let dir = TempDir::new().unwrap();
        run_in(
            dir.path(),
            false,
            Some(InitialWeb {
                name: "Main".to_string(),
                address: "wiki".to_string(),
            }),
        )
        .unwrap();

        let ctx = CommandContext::load_in(dir.path().to_path_buf(), None).unwrap();
        assert_eq!(ctx.store.require_web("wiki").unwrap().name, "Main");
    }

    #[test]
    fn test_init_twice_requires_force() {
        let dir = TempDir::new().unwrap();
        run_in(dir.path(), false, None).unwrap();

        assert!(run_in(dir.path(), false, None).is_err());
        assert!(run_in(dir.path(), true, None).is_ok());
    }
}
