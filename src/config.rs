use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const STAGING_PREFIX: &str = "staging";
pub const PRODUCTION_PREFIX: &str = "production";

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_MAIN_BRANCH: &str = "master";
pub const DEFAULT_SCM: &str = "git";

pub const STAGING_TAG_MESSAGE: &str = "tagging current code for deployment to staging";
pub const PRODUCTION_TAG_MESSAGE: &str = "tagging current code for deployment to production";

pub const DESCRIPTION_PROMPT: &str = "What does this release introduce? (this will be normalized and used in the tag for this release)";

pub const CONFIG_DIR_NAME: &str = "flowtag";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const REPO_CONFIG_FILE_NAME: &str = ".flowtag.toml";

/// Settings read from TOML. Every field is optional so a repository file only
/// needs to name what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub remote: Option<String>,
    pub main_branch: Option<String>,
    pub scm: Option<String>,
    pub git_log_command: Option<String>,
    pub author: Option<String>,
    pub open_browser: Option<bool>,
}

impl Config {
    /// User config first, then the repository's `.flowtag.toml` on top.
    pub fn load(repo_root: Option<&Path>) -> Result<Self> {
        let mut config = match Self::user_config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        if let Some(root) = repo_root {
            config = config.merge(Self::from_file(&root.join(REPO_CONFIG_FILE_NAME))?);
        }
        Ok(config)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// A missing file is an empty config.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fields set in `other` win.
    pub fn merge(self, other: Config) -> Config {
        Config {
            remote: other.remote.or(self.remote),
            main_branch: other.main_branch.or(self.main_branch),
            scm: other.scm.or(self.scm),
            git_log_command: other.git_log_command.or(self.git_log_command),
            author: other.author.or(self.author),
            open_browser: other.open_browser.or(self.open_browser),
        }
    }
}
