use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::error::{BranchDiffError, Result};

/// Options for the `init` command.
pub struct InitOptions {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub force: bool,
}

/// Result of a successful `init` operation.
#[derive(Debug)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub overwritten: bool,
}

/// Run the init command: write a default config file.
pub fn run(options: InitOptions) -> Result<InitResult> {
    if !options.root.exists() {
        return Err(BranchDiffError::invalid_path(
            options.root.display().to_string(),
            "directory does not exist",
        ));
    }
    if !options.root.is_dir() {
        return Err(BranchDiffError::invalid_path(
            options.root.display().to_string(),
            "not a directory",
        ));
    }

    let config_path = options
        .config_path
        .unwrap_or_else(|| options.root.join(CONFIG_FILE_NAME));

    let exists = config_path.exists();
    if exists && !options.force {
        return Err(BranchDiffError::config(format!(
            "config already exists at '{}' (use --force to overwrite)",
            config_path.display()
        )));
    }

    Config::default().save(&config_path)?;

    Ok(InitResult {
        config_path,
        overwritten: exists,
    })
}
