use log::debug;

use crate::context::DeployContext;
use crate::error::CliError;
use crate::git::TagRepository;

/// Refuse to deploy when `HEAD` differs from what `local_branch` last published.
///
/// The published state is the remote-tracking ref `<remote>/<branch>`; without
/// one (no remote, never pushed) the local branch of the same name stands in.
pub fn verify_up_to_date(
    ctx: &DeployContext,
    repo: &dyn TagRepository,
    local_branch: &str,
) -> Result<(), CliError> {
    if !ctx.using_git() {
        debug!("Not using git, skipping up-to-date check");
        return Ok(());
    }

    let local = repo.resolve("HEAD")?;
    let tracking = format!("refs/remotes/{}/{}", ctx.remote, local_branch);
    let published = match repo.resolve(&tracking) {
        Ok(revision) => revision,
        Err(CliError::UnknownRef(_)) => {
            debug!("No {} ref, comparing against {}", tracking, local_branch);
            repo.resolve(local_branch)?
        }
        Err(e) => return Err(e),
    };

    if local != published {
        return Err(CliError::OutOfSync {
            branch: local_branch.to_string(),
            remote: ctx.remote.clone(),
        });
    }
    debug!("{} is up to date at {}", local_branch, local);
    Ok(())
}
