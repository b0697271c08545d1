mod guard;
mod range;

use std::fmt;

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use crate::config::{DESCRIPTION_PROMPT, PRODUCTION_TAG_MESSAGE, STAGING_TAG_MESSAGE};
use crate::context::DeployContext;
use crate::error::CliError;
use crate::git::{CommitRange, TagRepository};
use crate::input::Prompter;
use crate::logger;
use crate::tag::{author_token, next_serial, slugify, ReleaseTag, Stage};

pub use guard::verify_up_to_date;
pub use range::{github_compare_url, CommitLogView};

/// Outcome of tagging: a fresh tag, or one that already pointed at the revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tagging {
    Created(ReleaseTag),
    Existing(ReleaseTag),
}

impl Tagging {
    pub fn tag(&self) -> &ReleaseTag {
        match self {
            Tagging::Created(tag) | Tagging::Existing(tag) => tag,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, Tagging::Created(_))
    }
}

/// What the deploy should check out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "ref", rename_all = "lowercase")]
pub enum DeployTarget {
    Tag(ReleaseTag),
    Branch(String),
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployTarget::Tag(tag) => write!(f, "{}", tag),
            DeployTarget::Branch(branch) => f.write_str(branch),
        }
    }
}

/// Staging/production tag bookkeeping for one deploy invocation.
pub struct Gitflow<'a> {
    ctx: &'a DeployContext,
    repo: &'a dyn TagRepository,
    prompter: &'a dyn Prompter,
}

impl<'a> Gitflow<'a> {
    pub fn new(
        ctx: &'a DeployContext,
        repo: &'a dyn TagRepository,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Gitflow {
            ctx,
            repo,
            prompter,
        }
    }

    pub fn last_tag(&self, stage: Stage) -> Result<Option<String>, CliError> {
        self.repo.find_latest_tag(&stage.pattern())
    }

    /// Next staging tag for `today`: serial follows the day's latest staging tag.
    pub fn compute_next_staging_tag(
        &self,
        today: NaiveDate,
        author: &str,
        description: &str,
    ) -> Result<ReleaseTag, CliError> {
        let slug = slugify(description)?;
        let author = author_token(author)?;

        // Serials are unique per day, so every tag of the day counts, not just
        // the ones reachable from HEAD.
        let todays: Vec<ReleaseTag> = self
            .repo
            .list_tags(&Stage::Staging.pattern_for_date(today))?
            .iter()
            .filter_map(|name| match ReleaseTag::parse(name) {
                Ok(tag) => Some(tag),
                Err(e) => {
                    debug!("Ignoring tag {}: {}", name, e);
                    None
                }
            })
            .collect();
        let serial = next_serial(&todays, today)?;
        debug!(
            "{} staging tags for {}, next serial {}",
            todays.len(),
            today,
            serial
        );

        ReleaseTag::new(Stage::Staging, today, serial, author, slug)
    }

    /// `--description` if given, otherwise ask the operator.
    pub fn release_description(&self) -> Result<String, CliError> {
        match &self.ctx.description {
            Some(description) => Ok(description.clone()),
            None => self.prompter.describe_release(DESCRIPTION_PROMPT),
        }
    }

    /// Tag `HEAD` for staging unless the latest staging tag already points at it.
    pub fn tag_staging(&self) -> Result<Tagging, CliError> {
        let head = self.repo.resolve("HEAD")?;

        if let Some(last) = self.last_tag(Stage::Staging)? {
            if self.repo.resolve(&last)? == head {
                logger::info(&format!(
                    "Not re-tagging staging because latest tag ({}) already points to HEAD",
                    last
                ));
                return Ok(Tagging::Existing(ReleaseTag::parse(&last)?));
            }
        }

        let description = self.release_description()?;
        let tag = self.compute_next_staging_tag(self.ctx.today, &self.ctx.author, &description)?;

        logger::progress(&format!(
            "Tagging current branch for deployment to staging as '{}'",
            tag
        ));
        self.repo
            .create_tag(&tag.to_string(), STAGING_TAG_MESSAGE, &head)?;
        Ok(Tagging::Created(tag))
    }

    /// Promote `requested` (or the latest staging tag) to production.
    ///
    /// An explicitly requested tag skips the confirmation before a new
    /// production tag; re-deploying an existing production tag always asks.
    pub fn tag_production(&self, requested: Option<&str>) -> Result<Tagging, CliError> {
        let candidate_name = match requested {
            Some(name) => name.to_string(),
            None => self
                .last_tag(Stage::Staging)?
                .ok_or(CliError::NoStagingTag)?,
        };
        let candidate = ReleaseTag::parse(&candidate_name)?;
        if candidate.stage() != Stage::Staging {
            return Err(CliError::NoStagingTag);
        }

        let target = match self.repo.resolve(&candidate_name) {
            Ok(revision) => revision,
            Err(CliError::UnknownRef(_)) => {
                return Err(CliError::StagingTagNotFound(candidate_name))
            }
            Err(e) => return Err(e),
        };

        let production = candidate.promote()?;
        let production_name = production.to_string();

        if self.tag_exists(&production_name)? {
            logger::info(&format!(
                "Not re-tagging {} because it already exists",
                production_name
            ));
            self.confirm_deploy(&production_name)?;
            return Ok(Tagging::Existing(production));
        }

        logger::info(&format!(
            "Preparing to promote staging tag '{}' to '{}'",
            candidate_name, production_name
        ));
        let range = self.commit_range(Stage::Production, Some(&candidate_name))?;
        self.show_commit_log(&range)?;

        if requested.is_none() {
            self.confirm_deploy(&production_name)?;
        }

        logger::progress(&format!(
            "Promoting staging tag {} to production as '{}'",
            candidate_name, production_name
        ));
        self.repo
            .create_tag(&production_name, PRODUCTION_TAG_MESSAGE, &target)?;
        Ok(Tagging::Created(production))
    }

    fn tag_exists(&self, name: &str) -> Result<bool, CliError> {
        match self.repo.resolve(name) {
            Ok(_) => Ok(true),
            Err(CliError::UnknownRef(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn confirm_deploy(&self, name: &str) -> Result<(), CliError> {
        let message = format!("Do you really want to deploy {}?", name);
        if self.prompter.confirm(&message, false)? {
            Ok(())
        } else {
            Err(CliError::Declined(format!("deploy of {} declined", name)))
        }
    }

    /// Commits between the previous release of `stage` and what would ship next.
    /// `upper` replaces the computed end of the range.
    pub fn commit_range(&self, stage: Stage, upper: Option<&str>) -> Result<CommitRange, CliError> {
        let (from, to) = match stage {
            Stage::Production => {
                let from = self.last_tag(Stage::Production)?;
                let to = match upper {
                    Some(upper) => upper.to_string(),
                    None => self
                        .last_tag(Stage::Staging)?
                        .ok_or(CliError::NoStagingTag)?,
                };
                (from, to)
            }
            Stage::Staging => {
                let from = self.last_tag(Stage::Staging)?;
                let to = upper
                    .map(String::from)
                    .unwrap_or_else(|| self.ctx.main_branch.clone());
                (from, to)
            }
        };
        Ok(CommitRange { from, to })
    }

    /// Range for the configured stage; `--tag` overrides its end.
    pub fn pending_range(&self) -> Result<CommitRange, CliError> {
        let stage = self.ctx.release_stage()?;
        if self.ctx.tag.is_none() {
            info!("Calculating 'end' tag for commit log for '{}'", stage);
        }
        self.commit_range(stage, self.ctx.tag.as_deref())
    }

    /// Show the operator what the next release of the configured stage contains.
    pub fn commit_log(&self) -> Result<(CommitRange, CommitLogView), CliError> {
        let range = self.pending_range()?;
        let view = self.show_commit_log(&range)?;
        Ok((range, view))
    }

    fn show_commit_log(&self, range: &CommitRange) -> Result<CommitLogView, CliError> {
        let view = CommitLogView::plan(self.ctx, self.repo, range)?;
        view.show(range, self.ctx.open_browser)?;
        Ok(view)
    }

    /// The `before deploy` hook: fetch, tag for the stage, publish.
    /// Stages without a tag namespace deploy the current branch as-is.
    /// Returns `None` when the deploy does not use git.
    pub fn calculate_tag(&self) -> Result<Option<DeployTarget>, CliError> {
        if !self.ctx.using_git() {
            debug!("Not using git, skipping tag calculation");
            return Ok(None);
        }

        // Pick up tags pushed by others so the serial does not collide.
        self.repo.fetch(&self.ctx.remote)?;
        let branch = self.repo.current_branch()?;

        let tagging = match self.ctx.release_stage() {
            Ok(Stage::Staging) => self.tag_staging()?,
            Ok(Stage::Production) => self.tag_production(self.ctx.tag.as_deref())?,
            Err(CliError::UnsupportedStage(_)) => {
                logger::info(&format!("Will deploy tag: {}", branch));
                return Ok(Some(DeployTarget::Branch(branch)));
            }
            Err(e) => return Err(e),
        };

        self.repo.push_tags(&self.ctx.remote, &branch)?;
        if tagging.created() {
            logger::success(&format!("Tagged and pushed {}", tagging.tag()));
        }
        Ok(Some(DeployTarget::Tag(tagging.tag().clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Scm;
    use crate::git::{MockTagRepository, Revision};
    use crate::input::MockPrompter;
    use mockall::predicate::*;

    fn ctx(stage: &str) -> DeployContext {
        DeployContext::new(stage, "bob", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn test_tag_staging_is_a_no_op_when_head_is_tagged() {
        let ctx = ctx("staging");
        let mut repo = MockTagRepository::new();
        repo.expect_find_latest_tag()
            .with(eq("staging-*"))
            .returning(|_| Ok(Some("staging-2024-01-01-1-alice-fix-bug".to_string())));
        repo.expect_resolve()
            .returning(|_| Ok(Revision::new("r1")));
        repo.expect_create_tag().never();
        let mut prompter = MockPrompter::new();
        prompter.expect_describe_release().never();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let result = flow.tag_staging().unwrap();

        assert!(!result.created());
        assert_eq!(result.tag().to_string(), "staging-2024-01-01-1-alice-fix-bug");
    }

    #[test]
    fn test_tag_staging_asks_for_description() {
        let ctx = ctx("staging");
        let mut repo = MockTagRepository::new();
        repo.expect_find_latest_tag()
            .with(eq("staging-*"))
            .returning(|_| Ok(Some("staging-2024-01-01-1-alice-fix-bug".to_string())));
        repo.expect_list_tags()
            .with(eq("staging-2024-01-01-*"))
            .returning(|_| {
                Ok(vec![
                    "staging-2024-01-01-1-alice-fix-bug".to_string(),
                    "staging-2024-01-01-not-a-release".to_string(),
                ])
            });
        repo.expect_resolve().returning(|refname| match refname {
            "HEAD" => Ok(Revision::new("r2")),
            _ => Ok(Revision::new("r1")),
        });
        repo.expect_create_tag()
            .with(
                eq("staging-2024-01-01-2-bob-add-widget"),
                always(),
                eq(Revision::new("r2")),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut prompter = MockPrompter::new();
        prompter
            .expect_describe_release()
            .times(1)
            .returning(|_| Ok("Add Widget".to_string()));

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let result = flow.tag_staging().unwrap();

        assert!(result.created());
        assert_eq!(result.tag().serial(), 2);
    }

    #[test]
    fn test_empty_description_creates_nothing() {
        let ctx = ctx("staging");
        let mut repo = MockTagRepository::new();
        repo.expect_find_latest_tag().returning(|_| Ok(None));
        repo.expect_create_tag().never();
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let result = flow.compute_next_staging_tag(ctx.today, "bob", "  ?! ");
        assert!(matches!(result, Err(CliError::EmptyInput(_))));
    }

    #[test]
    fn test_re_promotion_never_creates_a_tag() {
        let ctx = ctx("production");
        let mut repo = MockTagRepository::new();
        repo.expect_find_latest_tag()
            .with(eq("staging-*"))
            .returning(|_| Ok(Some("staging-2024-01-01-2-bob-add-widget".to_string())));
        repo.expect_resolve().returning(|_| Ok(Revision::new("r2")));
        repo.expect_create_tag().never();
        let mut prompter = MockPrompter::new();
        prompter
            .expect_confirm()
            .with(always(), eq(false))
            .times(1)
            .returning(|_, _| Ok(true));

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let result = flow.tag_production(None).unwrap();

        assert_eq!(
            result,
            Tagging::Existing(ReleaseTag::parse("production-2024-01-01-2-bob-add-widget").unwrap())
        );
    }

    #[test]
    fn test_re_promotion_declined() {
        let ctx = ctx("production");
        let mut repo = MockTagRepository::new();
        repo.expect_find_latest_tag()
            .returning(|_| Ok(Some("staging-2024-01-01-2-bob-x".to_string())));
        repo.expect_resolve().returning(|_| Ok(Revision::new("r2")));
        repo.expect_create_tag().never();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|_, default| Ok(default));

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let err = flow.tag_production(None).unwrap_err();
        assert!(err.is_declined());
    }

    #[test]
    fn test_next_staging_tag_counts_tags_off_the_current_line() {
        let ctx = ctx("staging");
        let mut repo = MockTagRepository::new();
        repo.expect_find_latest_tag().never();
        repo.expect_list_tags().returning(|_| {
            Ok(vec![
                "staging-2024-01-01-1-bob-one".to_string(),
                "staging-2024-01-01-2-bob-two".to_string(),
            ])
        });
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let tag = flow.compute_next_staging_tag(ctx.today, "bob", "three").unwrap();
        assert_eq!(tag.to_string(), "staging-2024-01-01-3-bob-three");
    }

    #[test]
    fn test_tag_production_rejects_production_tag_request() {
        let ctx = ctx("production");
        let repo = MockTagRepository::new();
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let result = flow.tag_production(Some("production-2024-01-01-2-bob-add-widget"));
        assert!(matches!(result, Err(CliError::NoStagingTag)));
    }

    #[test]
    fn test_commit_range_for_staging_ends_at_main_branch() {
        let mut ctx = ctx("staging");
        ctx.main_branch = "main".to_string();
        let mut repo = MockTagRepository::new();
        repo.expect_find_latest_tag()
            .with(eq("staging-*"))
            .returning(|_| Ok(Some("staging-2024-01-01-1-alice-fix-bug".to_string())));
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let range = flow.commit_range(Stage::Staging, None).unwrap();
        assert_eq!(range.from.as_deref(), Some("staging-2024-01-01-1-alice-fix-bug"));
        assert_eq!(range.to, "main");

        let range = flow.commit_range(Stage::Staging, Some("feature")).unwrap();
        assert_eq!(range.to, "feature");
    }

    #[test]
    fn test_commit_log_unsupported_stage() {
        let ctx = ctx("qa");
        let repo = MockTagRepository::new();
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        assert!(matches!(
            flow.commit_log(),
            Err(CliError::UnsupportedStage(stage)) if stage == "qa"
        ));
    }

    #[test]
    fn test_calculate_tag_for_other_stage_deploys_branch() {
        let ctx = ctx("qa");
        let mut repo = MockTagRepository::new();
        repo.expect_fetch().with(eq("origin")).times(1).returning(|_| Ok(()));
        repo.expect_current_branch()
            .returning(|| Ok("develop".to_string()));
        repo.expect_push_tags().never();
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        let target = flow.calculate_tag().unwrap();
        assert_eq!(target, Some(DeployTarget::Branch("develop".to_string())));
    }

    #[test]
    fn test_calculate_tag_skipped_without_git() {
        let mut ctx = ctx("staging");
        ctx.scm = Scm::Other;
        let repo = MockTagRepository::new();
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        assert_eq!(flow.calculate_tag().unwrap(), None);
    }

    #[test]
    fn test_calculate_tag_push_failure_is_fatal() {
        let ctx = ctx("staging");
        let mut repo = MockTagRepository::new();
        repo.expect_fetch().returning(|_| Ok(()));
        repo.expect_current_branch()
            .returning(|| Ok("master".to_string()));
        repo.expect_find_latest_tag()
            .returning(|_| Ok(Some("staging-2024-01-01-1-alice-fix-bug".to_string())));
        repo.expect_resolve().returning(|_| Ok(Revision::new("r1")));
        repo.expect_push_tags().returning(|remote, _| {
            Err(CliError::PushRejected {
                remote: remote.to_string(),
                reason: "non-fast-forward".to_string(),
            })
        });
        let prompter = MockPrompter::new();

        let flow = Gitflow::new(&ctx, &repo, &prompter);
        assert!(matches!(
            flow.calculate_tag(),
            Err(CliError::PushRejected { .. })
        ));
    }
}
