use std::env;
use std::path::Path;

use git2::{Config, Repository};
use log::debug;

use super::history::{self, CommitRange, CommitSummary};
use super::remote;
use super::{Revision, TagRepository};
use crate::error::CliError;

pub fn discover_repository() -> Result<Repository, CliError> {
    let current_dir = env::current_dir()?;
    log::debug!("Starting repository discovery from: {current_dir:?}");

    match Repository::discover(&current_dir) {
        Ok(repo) => Ok(repo),
        Err(e) => {
            log::error!("Failed to discover repository from {current_dir:?}: {e}");
            Err(CliError::GitError(git2::Error::from_str(
                "Could not find Git repository in current directory or any parent directories",
            )))
        }
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match config.get_string(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

/// [`TagRepository`] backed by a libgit2 handle on a working copy.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    pub fn discover() -> Result<Self, CliError> {
        Ok(GitRepository {
            repo: discover_repository()?,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, CliError> {
        Ok(GitRepository {
            repo: Repository::open(path)?,
        })
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    pub fn user_name(&self) -> Option<String> {
        let config = self.repo.config().ok()?;
        get_config_value(&config, "user.name")
    }
}

impl TagRepository for GitRepository {
    fn find_latest_tag(&self, pattern: &str) -> Result<Option<String>, CliError> {
        history::latest_tag_matching(&self.repo, pattern)
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<String>, CliError> {
        Ok(self
            .repo
            .tag_names(Some(pattern))?
            .iter()
            .flatten()
            .map(String::from)
            .collect())
    }

    fn resolve(&self, refname: &str) -> Result<Revision, CliError> {
        history::commit_for_ref(&self.repo, refname).map(Revision::from)
    }

    fn create_tag(&self, name: &str, message: &str, target: &Revision) -> Result<(), CliError> {
        if self
            .repo
            .find_reference(&format!("refs/tags/{}", name))
            .is_ok()
        {
            return Err(CliError::TagAlreadyExists(name.to_string()));
        }

        let oid = git2::Oid::from_str(target.as_str())
            .map_err(|_| CliError::UnknownRef(target.to_string()))?;
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|_| CliError::UnknownRef(target.to_string()))?;
        let signature = self.repo.signature()?;

        debug!("Creating tag {} on {}", name, target);
        self.repo
            .tag(name, &object, &signature, message, false)
            .map_err(|e| match e.code() {
                git2::ErrorCode::Exists => CliError::TagAlreadyExists(name.to_string()),
                _ => CliError::GitError(e),
            })?;
        Ok(())
    }

    fn push_tags(&self, remote_name: &str, branch: &str) -> Result<(), CliError> {
        remote::push_tags(&self.repo, remote_name, branch)
    }

    fn fetch(&self, remote_name: &str) -> Result<(), CliError> {
        remote::fetch(&self.repo, remote_name)
    }

    fn remote_url(&self, remote_name: &str) -> Result<Option<String>, CliError> {
        remote::remote_url(&self.repo, remote_name)
    }

    fn current_branch(&self) -> Result<String, CliError> {
        if self.repo.head_detached()? {
            return Err(CliError::Generic(
                "HEAD is detached; check out the branch you want to deploy".to_string(),
            ));
        }
        self.repo
            .head()?
            .shorthand()
            .map(String::from)
            .ok_or_else(|| CliError::Generic("Failed to get current branch".to_string()))
    }

    fn commits_between(&self, range: &CommitRange) -> Result<Vec<CommitSummary>, CliError> {
        history::commits_between(&self.repo, range)
    }
}
