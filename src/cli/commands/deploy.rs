use log::info;
use structopt::StructOpt;

use super::print_target;
use crate::cli::{Command, GlobalOptions, Session};
use crate::error::CliError;
use crate::git::TagRepository;
use crate::release::{verify_up_to_date, Gitflow};

/// The hooks that run before a deploy, in order: calculate the tag, then
/// make sure the branch is up to date.
#[derive(Debug, StructOpt)]
pub struct DeployCommand {
    /// Output format: text or json
    #[structopt(long, default_value = "text", possible_values = &["text", "json"])]
    output: String,
}

impl Command for DeployCommand {
    fn execute(&self, options: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(options)?;
        let flow = Gitflow::new(&session.ctx, &session.repo, session.prompter.as_ref());

        let target = flow.calculate_tag()?;
        if session.ctx.using_git() {
            let branch = session.repo.current_branch()?;
            verify_up_to_date(&session.ctx, &session.repo, &branch)?;
        }

        if let Some(target) = &target {
            info!("Ready to deploy {} to {}", target, session.ctx.stage);
        }
        print_target(&self.output, &session.ctx.stage, target.as_ref())
    }
}
