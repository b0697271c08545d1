mod history;
mod remote;
mod repository;

use std::fmt;

use crate::error::CliError;

pub use history::{CommitRange, CommitSummary};
pub use repository::{discover_repository, GitRepository};

/// Content hash of a commit. Two refs are the same release iff their revisions are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(id: impl Into<String>) -> Self {
        Revision(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<git2::Oid> for Revision {
    fn from(oid: git2::Oid) -> Self {
        Revision(oid.to_string())
    }
}

/// The version-control operations the release flow is allowed to use.
#[cfg_attr(test, mockall::automock)]
pub trait TagRepository {
    /// Most recent tag (in history order) whose name matches the glob `pattern`.
    fn find_latest_tag(&self, pattern: &str) -> Result<Option<String>, CliError>;

    /// Every tag name matching the glob `pattern`, in no particular order.
    fn list_tags(&self, pattern: &str) -> Result<Vec<String>, CliError>;

    /// Revision a tag, branch or `HEAD` points at.
    fn resolve(&self, refname: &str) -> Result<Revision, CliError>;

    /// Create an annotated tag on `target`.
    fn create_tag(&self, name: &str, message: &str, target: &Revision) -> Result<(), CliError>;

    /// Publish every local tag and `branch` to `remote`.
    fn push_tags(&self, remote: &str, branch: &str) -> Result<(), CliError>;

    /// Pull tags and branch heads from `remote`.
    fn fetch(&self, remote: &str) -> Result<(), CliError>;

    fn remote_url(&self, remote: &str) -> Result<Option<String>, CliError>;

    fn current_branch(&self) -> Result<String, CliError>;

    fn commits_between(&self, range: &CommitRange) -> Result<Vec<CommitSummary>, CliError>;
}
