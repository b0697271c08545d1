use std::str::FromStr;

use chrono::NaiveDate;

use crate::config::{Config, DEFAULT_MAIN_BRANCH, DEFAULT_REMOTE, DEFAULT_SCM};
use crate::error::CliError;
use crate::tag::Stage;

/// Which version-control backend the deploy uses. Tag bookkeeping only runs for git.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scm {
    Git,
    Other,
}

impl FromStr for Scm {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "git" => Ok(Scm::Git),
            "" => Err(CliError::ConfigError("scm must not be empty".to_string())),
            _ => Ok(Scm::Other),
        }
    }
}

/// Everything a deploy invocation knows, fixed before any operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    pub stage: String,
    pub tag: Option<String>,
    pub git_log_command: Option<String>,
    pub description: Option<String>,
    pub author: String,
    pub today: NaiveDate,
    pub remote: String,
    pub main_branch: String,
    pub scm: Scm,
    pub non_interactive: bool,
    pub open_browser: bool,
}

impl DeployContext {
    /// A context with defaults for everything but the stage, author and date.
    pub fn new(stage: impl Into<String>, author: impl Into<String>, today: NaiveDate) -> Self {
        DeployContext {
            stage: stage.into(),
            tag: None,
            git_log_command: None,
            description: None,
            author: author.into(),
            today,
            remote: DEFAULT_REMOTE.to_string(),
            main_branch: DEFAULT_MAIN_BRANCH.to_string(),
            scm: Scm::Git,
            non_interactive: false,
            open_browser: true,
        }
    }

    /// Fill the fields the caller left at their defaults from a loaded config.
    pub fn with_config(mut self, config: &Config) -> Result<Self, CliError> {
        if let Some(remote) = &config.remote {
            self.remote = remote.clone();
        }
        if let Some(branch) = &config.main_branch {
            self.main_branch = branch.clone();
        }
        self.scm = Scm::from_str(config.scm.as_deref().unwrap_or(DEFAULT_SCM))?;
        if self.git_log_command.is_none() {
            self.git_log_command = config.git_log_command.clone();
        }
        if let Some(open) = config.open_browser {
            self.open_browser = open;
        }
        Ok(self)
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_git_log_command(mut self, command: Option<String>) -> Self {
        self.git_log_command = command.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_non_interactive(mut self, non_interactive: bool) -> Self {
        self.non_interactive = non_interactive;
        self
    }

    /// The stage as a release namespace. Fails for stages without tags (e.g. `qa`).
    pub fn release_stage(&self) -> Result<Stage, CliError> {
        Stage::from_str(&self.stage)
    }

    pub fn using_git(&self) -> bool {
        self.scm == Scm::Git
    }
}
