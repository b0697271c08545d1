use std::cell::{Cell, RefCell};

use git2::{Cred, CredentialType, FetchOptions, PushOptions, RemoteCallbacks, Repository};
use log::{debug, error, info};

use crate::error::CliError;

/// SSH agent first, then the default key file, then git's credential helper.
/// libgit2 retries the callback on failure, so each source is tried once.
fn remote_callbacks<'a>(repo: &'a Repository, attempts: &'a Cell<u32>) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed_types| {
        let attempt = attempts.get();
        attempts.set(attempt + 1);
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if attempt == 0 {
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }
            if attempt <= 1 {
                attempts.set(2);
                let key = dirs::home_dir()
                    .map(|home| home.join(".ssh").join("id_rsa"))
                    .filter(|key| key.exists());
                if let Some(key) = key {
                    return Cred::ssh_key(username, None, &key, None);
                }
            }
        } else if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) && attempt == 0 {
            let config = repo.config()?;
            return Cred::credential_helper(&config, url, username_from_url);
        } else if allowed_types.contains(CredentialType::DEFAULT) && attempt == 0 {
            return Cred::default();
        }
        Err(git2::Error::from_str("no usable credentials for remote"))
    });
    callbacks
}

fn log_auth_hint(e: &git2::Error) {
    if e.code() == git2::ErrorCode::Auth {
        error!("Authentication error. Please ensure your credentials are set up correctly.");
        error!("For SSH: Ensure your SSH key is added to the ssh-agent or located at ~/.ssh/id_rsa");
        error!("For HTTPS: Check your Git credential helper or use a personal access token.");
    }
}

pub(super) fn fetch(repo: &Repository, remote_name: &str) -> Result<(), CliError> {
    let mut remote = match repo.find_remote(remote_name) {
        Ok(remote) => remote,
        Err(e) if e.code() == git2::ErrorCode::NotFound => {
            debug!("No remote '{}' found, skipping fetch", remote_name);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let attempts = Cell::new(0);
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks(repo, &attempts));

    let heads = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
    remote
        .fetch(&[heads.as_str(), "refs/tags/*:refs/tags/*"], Some(&mut options), None)
        .map_err(|e| {
            error!("Failed to fetch from {}: {}", remote_name, e);
            log_auth_hint(&e);
            CliError::from(e)
        })
}

pub(super) fn push_tags(repo: &Repository, remote_name: &str, branch: &str) -> Result<(), CliError> {
    let mut remote = match repo.find_remote(remote_name) {
        Ok(remote) => remote,
        Err(e) if e.code() == git2::ErrorCode::NotFound => {
            info!("No remote '{}' configured, nothing to push", remote_name);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut refspecs: Vec<String> = repo
        .tag_names(None)?
        .iter()
        .flatten()
        .map(|name| format!("refs/tags/{0}:refs/tags/{0}", name))
        .collect();
    refspecs.push(format!("refs/heads/{0}:refs/heads/{0}", branch));
    debug!("Pushing {} refs to {}", refspecs.len(), remote_name);

    let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let attempts = Cell::new(0);
    {
        let mut callbacks = remote_callbacks(repo, &attempts);
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                rejected
                    .borrow_mut()
                    .push(format!("{} ({})", refname, message));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        remote.push(&refspecs, Some(&mut options)).map_err(|e| {
            log_auth_hint(&e);
            CliError::PushRejected {
                remote: remote_name.to_string(),
                reason: e.message().to_string(),
            }
        })?;
    }

    let rejected = rejected.into_inner();
    if !rejected.is_empty() {
        return Err(CliError::PushRejected {
            remote: remote_name.to_string(),
            reason: format!("rejected {}", rejected.join(", ")),
        });
    }
    Ok(())
}

pub(super) fn remote_url(repo: &Repository, remote_name: &str) -> Result<Option<String>, CliError> {
    match repo.find_remote(remote_name) {
        Ok(remote) => Ok(remote.url().map(String::from)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
