use structopt::StructOpt;

use super::print_target;
use crate::cli::{Command, GlobalOptions, Session};
use crate::error::CliError;
use crate::release::Gitflow;

#[derive(Debug, StructOpt)]
pub struct CalculateTagCommand {
    /// Output format: text or json
    #[structopt(long, default_value = "text", possible_values = &["text", "json"])]
    output: String,
}

impl Command for CalculateTagCommand {
    fn execute(&self, options: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(options)?;
        let flow = Gitflow::new(&session.ctx, &session.repo, session.prompter.as_ref());

        let target = flow.calculate_tag()?;
        print_target(&self.output, &session.ctx.stage, target.as_ref())
    }
}
