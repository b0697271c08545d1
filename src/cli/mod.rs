pub mod commands;

use chrono::Local;
use log::debug;
use structopt::StructOpt;

use self::commands::{calculate_tag, commit_log, deploy, next_tag, verify};
use crate::config::Config;
use crate::context::DeployContext;
use crate::error::CliError;
use crate::git::GitRepository;
use crate::input::{NonInteractivePrompter, Prompter, TerminalPrompter};
use crate::tag::author_token;

pub trait Command {
    fn execute(&self, options: &GlobalOptions) -> Result<(), CliError>;
}

/// Deploy parameters shared by every subcommand.
#[derive(Debug, Clone, StructOpt)]
pub struct GlobalOptions {
    #[structopt(
        long,
        env = "STAGE",
        default_value = "staging",
        help = "Stage to deploy (staging, production, or any other stage deployed from its branch)"
    )]
    pub stage: String,

    #[structopt(
        long,
        help = "Tag to deploy instead of the latest one (e.g. a staging tag to promote)"
    )]
    pub tag: Option<String>,

    #[structopt(
        long = "git-log-command",
        env = "git_log_command",
        help = "git subcommand used to show the commits between releases"
    )]
    pub git_log_command: Option<String>,

    #[structopt(long, help = "What the release introduces; normalized into the tag name")]
    pub description: Option<String>,

    #[structopt(long, help = "Author written into new tags (defaults to the current user)")]
    pub author: Option<String>,

    #[structopt(long, help = "Remote to fetch from and push to")]
    pub remote: Option<String>,

    #[structopt(
        long = "main-branch",
        help = "Integration branch staging releases are cut from"
    )]
    pub main_branch: Option<String>,

    #[structopt(
        long = "non-interactive",
        help = "Never prompt; confirmations take their default"
    )]
    pub non_interactive: bool,

    #[structopt(
        short,
        long,
        parse(from_occurrences),
        help = "More logging (-v debug, -vv trace)"
    )]
    pub verbose: u8,

    #[structopt(short, long, help = "Only log errors")]
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(StructOpt)]
pub enum CliCommand {
    #[structopt(about = "Tag for the stage, push, and check the branch is up to date")]
    Deploy(deploy::DeployCommand),
    #[structopt(name = "calculate-tag", about = "Tag for the stage and push the tags")]
    CalculateTag(calculate_tag::CalculateTagCommand),
    #[structopt(
        name = "verify-up-to-date",
        about = "Check the current branch matches what was pushed"
    )]
    VerifyUpToDate(verify::VerifyCommand),
    #[structopt(
        name = "commit-log",
        alias = "pending",
        about = "Show commits between the last release and the next one"
    )]
    CommitLog(commit_log::CommitLogCommand),
    #[structopt(name = "next-tag", about = "Print the next staging tag without creating it")]
    NextTag(next_tag::NextTagCommand),
}

impl CliCommand {
    pub fn execute(&self, options: &GlobalOptions) -> Result<(), CliError> {
        match self {
            CliCommand::Deploy(cmd) => cmd.execute(options),
            CliCommand::CalculateTag(cmd) => cmd.execute(options),
            CliCommand::VerifyUpToDate(cmd) => cmd.execute(options),
            CliCommand::CommitLog(cmd) => cmd.execute(options),
            CliCommand::NextTag(cmd) => cmd.execute(options),
        }
    }
}

/// Everything a command works with: the repository, the frozen deploy
/// context and the way to talk to the operator.
pub struct Session {
    pub repo: GitRepository,
    pub ctx: DeployContext,
    pub prompter: Box<dyn Prompter>,
}

impl Session {
    /// Open the repository around the current directory and freeze the deploy context.
    pub fn open(options: &GlobalOptions) -> Result<Self, CliError> {
        let repo = GitRepository::discover()?;
        let config = Config::load(repo.workdir())
            .map_err(|e| CliError::ConfigError(format!("{:#}", e)))?;
        debug!("Loaded config: {:?}", config);

        let author = resolve_author(options, &config, &repo)?;
        let mut ctx =
            DeployContext::new(options.stage.clone(), author, Local::now().date_naive())
                .with_tag(options.tag.clone())
                .with_description(options.description.clone())
                .with_git_log_command(options.git_log_command.clone())
                .with_non_interactive(options.non_interactive)
                .with_config(&config)?;
        if let Some(remote) = &options.remote {
            ctx.remote = remote.clone();
        }
        if let Some(branch) = &options.main_branch {
            ctx.main_branch = branch.clone();
        }
        debug!("Deploy context: {:?}", ctx);

        let prompter: Box<dyn Prompter> = if ctx.non_interactive {
            Box::new(NonInteractivePrompter)
        } else {
            Box::new(TerminalPrompter)
        };
        Ok(Session {
            repo,
            ctx,
            prompter,
        })
    }
}

/// `--author`, then the config, then the login name, then git's `user.name`.
fn resolve_author(
    options: &GlobalOptions,
    config: &Config,
    repo: &GitRepository,
) -> Result<String, CliError> {
    let candidates = [
        options.author.clone(),
        config.author.clone(),
        std::env::var("USER").ok(),
        std::env::var("USERNAME").ok(),
        repo.user_name(),
    ];
    let author = candidates
        .into_iter()
        .flatten()
        .find(|name| author_token(name).is_ok())
        .ok_or_else(|| {
            CliError::ConfigError(
                "could not determine the tag author; pass --author or set `author` in the config"
                    .to_string(),
            )
        })?;
    author_token(&author)
}
