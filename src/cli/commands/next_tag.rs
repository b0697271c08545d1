use structopt::StructOpt;

use crate::cli::{Command, GlobalOptions, Session};
use crate::error::CliError;
use crate::git::TagRepository;
use crate::release::Gitflow;

/// Dry run of staging tag calculation: nothing is created or pushed.
#[derive(Debug, StructOpt)]
pub struct NextTagCommand {
    #[structopt(long = "no-fetch", help = "Do not fetch tags from the remote first")]
    no_fetch: bool,
}

impl Command for NextTagCommand {
    fn execute(&self, options: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(options)?;
        if !self.no_fetch {
            session.repo.fetch(&session.ctx.remote)?;
        }

        let flow = Gitflow::new(&session.ctx, &session.repo, session.prompter.as_ref());
        let description = flow.release_description()?;
        let tag =
            flow.compute_next_staging_tag(session.ctx.today, &session.ctx.author, &description)?;
        println!("{}", tag);
        Ok(())
    }
}
