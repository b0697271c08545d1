use serde::Serialize;
use structopt::StructOpt;

use crate::cli::{Command, GlobalOptions, Session};
use crate::error::CliError;
use crate::git::{CommitRange, CommitSummary, TagRepository};
use crate::release::Gitflow;

#[derive(Debug, StructOpt)]
pub struct CommitLogCommand {
    /// Output format: text or json
    #[structopt(long, default_value = "text", possible_values = &["text", "json"])]
    output: String,
}

#[derive(Serialize)]
struct CommitLogOutput<'a> {
    range: &'a CommitRange,
    count: usize,
    commits: &'a [CommitSummary],
}

impl Command for CommitLogCommand {
    fn execute(&self, options: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(options)?;
        let flow = Gitflow::new(&session.ctx, &session.repo, session.prompter.as_ref());

        if self.output == "json" {
            let range = flow.pending_range()?;
            let commits = session.repo.commits_between(&range)?;
            let payload = CommitLogOutput {
                range: &range,
                count: commits.len(),
                commits: &commits,
            };
            println!("{}", serde_json::to_string(&payload)?);
        } else {
            flow.commit_log()?;
        }
        Ok(())
    }
}
