pub mod calculate_tag;
pub mod commit_log;
pub mod deploy;
pub mod next_tag;
pub mod verify;

use serde::Serialize;

use crate::error::CliError;
use crate::release::DeployTarget;

#[derive(Serialize)]
struct TargetOutput<'a> {
    stage: &'a str,
    target: Option<&'a DeployTarget>,
}

/// Stdout carries only the ref to deploy so a deploy script can capture it.
pub(crate) fn print_target(
    output: &str,
    stage: &str,
    target: Option<&DeployTarget>,
) -> Result<(), CliError> {
    if output == "json" {
        let payload = TargetOutput { stage, target };
        println!("{}", serde_json::to_string(&payload)?);
    } else if let Some(target) = target {
        println!("{}", target);
    }
    Ok(())
}
