use std::collections::HashMap;
use std::fmt;

use git2::{Oid, Repository, Sort};
use log::debug;
use serde::Serialize;

use crate::error::CliError;
use crate::tag::ReleaseTag;

/// `from..to` as git understands it. No lower bound means "all history up to `to`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRange {
    pub from: Option<String>,
    pub to: String,
}

impl fmt::Display for CommitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{}..{}", from, self.to),
            None => f.write_str(&self.to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub id: String,
    pub author: String,
    pub summary: String,
}

impl fmt::Display for CommitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.id, self.summary, self.author)
    }
}

struct TagCandidate {
    name: String,
    tagged_at: Option<i64>,
    release: Option<(chrono::NaiveDate, u32)>,
}

pub(super) fn commit_for_ref(repo: &Repository, refname: &str) -> Result<Oid, CliError> {
    let object = repo.revparse_single(refname).map_err(|e| match e.code() {
        git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => {
            CliError::UnknownRef(refname.to_string())
        }
        _ => CliError::GitError(e),
    })?;
    Ok(object.peel_to_commit()?.id())
}

/// Walk history newest-first from every matching tag and return a tag on the
/// first tagged commit met. When several matching tags share that commit the
/// most recently annotated one wins.
pub(super) fn latest_tag_matching(
    repo: &Repository,
    pattern: &str,
) -> Result<Option<String>, CliError> {
    let names = repo.tag_names(Some(pattern))?;
    let mut by_commit: HashMap<Oid, Vec<TagCandidate>> = HashMap::new();

    for name in names.iter().flatten() {
        let refname = format!("refs/tags/{}", name);
        let reference = repo.find_reference(&refname)?;
        let commit = reference.peel_to_commit()?.id();
        let tagged_at = reference
            .peel_to_tag()
            .ok()
            .and_then(|tag| tag.tagger().map(|sig| sig.when().seconds()));
        let release = ReleaseTag::parse(name)
            .ok()
            .map(|tag| (tag.date(), tag.serial()));

        by_commit.entry(commit).or_default().push(TagCandidate {
            name: name.to_string(),
            tagged_at,
            release,
        });
    }

    if by_commit.is_empty() {
        debug!("No tags matching {}", pattern);
        return Ok(None);
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    for commit in by_commit.keys() {
        revwalk.push(*commit)?;
    }

    for oid in revwalk {
        let oid = oid?;
        if let Some(candidates) = by_commit.get(&oid) {
            let latest = candidates
                .iter()
                .max_by(|a, b| {
                    (a.tagged_at, a.release, &a.name).cmp(&(b.tagged_at, b.release, &b.name))
                })
                .map(|c| c.name.clone());
            debug!("Latest tag matching {}: {:?}", pattern, latest);
            return Ok(latest);
        }
    }

    Ok(None)
}

pub(super) fn commits_between(
    repo: &Repository,
    range: &CommitRange,
) -> Result<Vec<CommitSummary>, CliError> {
    debug!("Listing commits in {}", range);
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push(commit_for_ref(repo, &range.to)?)?;
    if let Some(from) = &range.from {
        revwalk.hide(commit_for_ref(repo, from)?)?;
    }

    let mut commits = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        commits.push(CommitSummary {
            id: commit.as_object().short_id()?.as_str().unwrap_or_default().to_string(),
            author: commit.author().name().unwrap_or_default().to_string(),
            summary: commit.summary().unwrap_or_default().to_string(),
        });
    }
    Ok(commits)
}
