use std::io;
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::context::DeployContext;
use crate::error::CliError;
use crate::git::{CommitRange, CommitSummary, TagRepository};
use crate::logger;

static GITHUB_REMOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:git@github\.com:|ssh://git@github\.com/|https://github\.com/)([^/]+)/([^/]+?)(?:\.git)?/?$")
        .expect("github remote regex is valid")
});

/// Web comparison link for a GitHub-hosted origin. `None` for other hosts or an
/// open-ended range.
pub fn github_compare_url(remote_url: &str, range: &CommitRange) -> Option<String> {
    let from = range.from.as_ref()?;
    let caps = GITHUB_REMOTE_REGEX.captures(remote_url.trim())?;
    Some(format!(
        "https://github.com/{}/{}/compare/{}...{}",
        &caps[1], &caps[2], from, range.to
    ))
}

/// How a commit range gets shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommitLogView {
    /// `git <custom command> from..to`, run through the shell
    Custom { command: String },
    Compare { url: String },
    Commits { commits: Vec<CommitSummary> },
}

impl CommitLogView {
    pub fn plan(
        ctx: &DeployContext,
        repo: &dyn TagRepository,
        range: &CommitRange,
    ) -> Result<Self, CliError> {
        if let Some(command) = &ctx.git_log_command {
            return Ok(CommitLogView::Custom {
                command: format!("git {} {}", command.trim(), range),
            });
        }

        if let Some(url) = repo.remote_url(&ctx.remote)? {
            if let Some(url) = github_compare_url(&url, range) {
                return Ok(CommitLogView::Compare { url });
            }
        }

        Ok(CommitLogView::Commits {
            commits: repo.commits_between(range)?,
        })
    }

    pub fn show(&self, range: &CommitRange, open_browser: bool) -> Result<(), CliError> {
        let from = range.from.as_deref().unwrap_or("the beginning");
        match self {
            CommitLogView::Custom { command } => {
                logger::info(&format!(
                    "Displaying commits from {} to {} via:\n{}",
                    from, range.to, command
                ));
                // stdout stays reserved for the ref to deploy
                let status = shell_command(command).stdout(io::stderr()).status()?;
                if !status.success() {
                    logger::warning(&format!("{} exited with {}", command, status));
                }
            }
            CommitLogView::Compare { url } => {
                logger::info(&format!(
                    "Displaying commits from {} to {} via:\n{}",
                    from, range.to, url
                ));
                if open_browser {
                    open_in_browser(url);
                }
            }
            CommitLogView::Commits { commits } => {
                logger::info(&format!(
                    "Displaying commits from {} to {} ({} commits)",
                    from,
                    range.to,
                    commits.len()
                ));
                for commit in commits {
                    log::info!("  {}", commit);
                }
            }
        }
        Ok(())
    }
}

/// Quoting in a configured log command follows the platform shell.
fn shell_command(command: &str) -> Command {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C");
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c");
        cmd
    };
    cmd.arg(command);
    cmd
}

fn open_in_browser(url: &str) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    if let Err(e) = Command::new(opener).arg(url).spawn() {
        logger::warning(&format!("Could not open {} with {}: {}", url, opener, e));
    }
}
