use structopt::StructOpt;

use crate::cli::{Command, GlobalOptions, Session};
use crate::error::CliError;
use crate::git::TagRepository;
use crate::logger;
use crate::release::verify_up_to_date;

#[derive(Debug, StructOpt)]
pub struct VerifyCommand {}

impl Command for VerifyCommand {
    fn execute(&self, options: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(options)?;
        if !session.ctx.using_git() {
            logger::info("Not using git, nothing to verify");
            return Ok(());
        }

        let branch = session.repo.current_branch()?;
        verify_up_to_date(&session.ctx, &session.repo, &branch)?;
        logger::success(&format!("{} is up to date", branch));
        Ok(())
    }
}
