use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Git error: {0}")]
    GitError(#[from] git2::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed tag name '{name}': {reason}")]
    Parse { name: String, reason: String },

    #[error("Unknown ref '{0}'")]
    UnknownRef(String),

    #[error("Tag '{0}' already exists")]
    TagAlreadyExists(String),

    #[error("git push to '{remote}' failed: {reason}")]
    PushRejected { remote: String, reason: String },

    #[error("Couldn't find a staging tag to deploy; use '--tag staging-YYYY-MM-DD-N-author-description'")]
    NoStagingTag,

    #[error("Staging tag {0} does not exist.")]
    StagingTagNotFound(String),

    #[error("No tag has been provided: {0:?}")]
    EmptyInput(String),

    #[error(
        "Your {branch} branch is not up to date with {remote}/{branch}.\n\
         Please make sure you have pulled and pushed all code before deploying:\n\n\
         git pull {remote} {branch}\n\
         # run tests, etc\n\
         git push {remote} {branch}\n"
    )]
    OutOfSync { branch: String, remote: String },

    #[error("Unsupported stage {0}")]
    UnsupportedStage(String),

    #[error("Aborted: {0}")]
    Declined(String),

    #[error("{0}")]
    Generic(String),
}

impl CliError {
    /// Operator said no. Not a failure, but still ends the run with a non-zero status.
    pub fn is_declined(&self) -> bool {
        matches!(self, CliError::Declined(_))
    }

    pub(crate) fn parse(name: &str, reason: impl Into<String>) -> Self {
        CliError::Parse {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
