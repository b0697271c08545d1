use inquire::validator::Validation;
use inquire::Text;
use log::debug;

use super::validation::{interpret_answer, validate_description};
use crate::error::CliError;

/// Operator interaction the release flow needs. Kept behind a trait so the
/// flow can run without a terminal.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Ask a yes/no question; an empty answer yields `default`.
    fn confirm(&self, message: &str, default: bool) -> Result<bool, CliError>;

    /// Ask for the free-text description of a release.
    fn describe_release(&self, message: &str) -> Result<String, CliError>;
}

fn confirm_suffix(default: bool) -> &'static str {
    if default {
        "[Y/n]"
    } else {
        "[y/N]"
    }
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, CliError> {
        let answer = Text::new(&format!("{} {}", message, confirm_suffix(default)))
            .prompt()
            .map_err(|e| CliError::InputError(e.to_string()))?;
        Ok(interpret_answer(&answer, default))
    }

    fn describe_release(&self, message: &str) -> Result<String, CliError> {
        Text::new(message)
            .with_validator(|s: &str| {
                Ok(match validate_description(s) {
                    Ok(()) => Validation::Valid,
                    Err(e) => Validation::Invalid(e.into()),
                })
            })
            .prompt()
            .map_err(|e| CliError::InputError(e.to_string()))
    }
}

/// Used with `--non-interactive`: confirmations take their default and
/// nothing is ever read from the terminal.
pub struct NonInteractivePrompter;

impl Prompter for NonInteractivePrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, CliError> {
        debug!("Non-interactive, answering {:?} with default {}", message, default);
        Ok(default)
    }

    fn describe_release(&self, _message: &str) -> Result<String, CliError> {
        Err(CliError::InputError(
            "A release description is required in non-interactive mode; pass --description"
                .to_string(),
        ))
    }
}
