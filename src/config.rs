use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BranchDiffError, Result};

/// Name of the per-repository config file.
pub const CONFIG_FILE_NAME: &str = ".branchdiff.json";

/// Narrowest terminal the layout accepts. Rows stay within it for line
/// numbers of up to 11 digits.
pub const MIN_TERMINAL_WIDTH: usize = 30;

/// Top-level configuration for branchdiff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Total width of a rendered report row, borders included.
    pub terminal_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { terminal_width: 80 }
    }
}

impl Config {
    /// Load config from a JSON file. A positive width below
    /// [`MIN_TERMINAL_WIDTH`] is raised to the minimum.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BranchDiffError::io(format!("reading config from '{}'", path.display()), e)
        })?;
        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| BranchDiffError::config_with_source("failed to parse config", e))?;
        if (1..MIN_TERMINAL_WIDTH).contains(&config.terminal_width) {
            warn!(
                path = %path.display(),
                width = config.terminal_width,
                "terminalWidth below minimum; using {MIN_TERMINAL_WIDTH}"
            );
            config.terminal_width = MIN_TERMINAL_WIDTH;
        }
        config.validate()?;
        Ok(config)
    }

    /// Find and load the config, falling back to defaults on any problem.
    ///
    /// A broken config file must never stop a report from being produced,
    /// so errors are logged and swallowed.
    pub fn load_or_default(root: &Path, explicit: Option<&Path>) -> Self {
        let Some(path) = find_config_file(root, explicit) else {
            debug!("no config file found; using defaults");
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), "ignoring config: {err}");
                Self::default()
            }
        }
    }

    /// Save config to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BranchDiffError::config_with_source("failed to serialize config", e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BranchDiffError::io(
                    format!("creating config directory '{}'", parent.display()),
                    e,
                )
            })?;
        }
        std::fs::write(path, content + "\n").map_err(|e| {
            BranchDiffError::io(format!("writing config to '{}'", path.display()), e)
        })
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<()> {
        if self.terminal_width < MIN_TERMINAL_WIDTH {
            return Err(BranchDiffError::validation(
                "terminalWidth",
                format!("must be at least {MIN_TERMINAL_WIDTH}"),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing Config with selective overrides.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn with_terminal_width(mut self, width: usize) -> Self {
        self.config.terminal_width = width;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Discover the config file using standard search order:
/// 1. Explicit path (if provided)
/// 2. `<root>/.branchdiff.json`
/// 3. `~/.branchdiff.json`
/// 4. Platform config dir (`branchdiff.json`)
pub fn find_config_file(root: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
        return None;
    }

    let local = root.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(home) = dirs_home() {
        let home_config = home.join(CONFIG_FILE_NAME);
        if home_config.exists() {
            return Some(home_config);
        }
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "branchdiff") {
        let platform = proj_dirs.config_dir().join("branchdiff.json");
        if platform.exists() {
            return Some(platform);
        }
    }

    None
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
        assert_eq!(Config::default().terminal_width, 80);
    }

    #[test]
    fn parses_camel_case_key() {
        let config: Config = serde_json::from_str(r#"{"terminalWidth": 120}"#).unwrap();
        assert_eq!(config.terminal_width, 120);
    }

    #[test]
    fn missing_key_uses_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn validation_rejects_narrow_width() {
        let config = Config { terminal_width: 5 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_with_width() {
        let config = ConfigBuilder::from_config(Config::default())
            .with_terminal_width(50)
            .build()
            .unwrap();
        assert_eq!(config.terminal_width, 50);
        assert!(ConfigBuilder::from_config(Config::default())
            .with_terminal_width(0)
            .build()
            .is_err());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = Config { terminal_width: 100 };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn load_or_default_reads_repo_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"terminalWidth": 64}"#).unwrap();
        let config = Config::load_or_default(dir.path(), None);
        assert_eq!(config.terminal_width, 64);
    }

    #[test]
    fn load_or_default_survives_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load_or_default(dir.path(), Some(&path));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_or_default_survives_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("negative.json");
        std::fs::write(&path, r#"{"terminalWidth": -3}"#).unwrap();
        assert_eq!(
            Config::load_or_default(dir.path(), Some(&path)),
            Config::default()
        );
    }

    #[test]
    fn narrow_width_is_raised_to_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"terminalWidth": 12}"#).unwrap();
        assert_eq!(Config::load(&path).unwrap().terminal_width, MIN_TERMINAL_WIDTH);
        assert_eq!(
            Config::load_or_default(dir.path(), None).terminal_width,
            MIN_TERMINAL_WIDTH
        );
    }

    #[test]
    fn zero_width_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.json");
        std::fs::write(&path, r#"{"terminalWidth": 0}"#).unwrap();
        assert!(Config::load(&path).is_err());
        assert_eq!(
            Config::load_or_default(dir.path(), Some(&path)),
            Config::default()
        );
    }

    #[test]
    fn explicit_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(find_config_file(dir.path(), Some(&missing)).is_none());
    }
}
