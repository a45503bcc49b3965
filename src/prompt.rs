//! Interactive prompts for host selection and argument editing.
//!
//! Both prompts block on user input; they are the only suspension points in
//! a run besides the external rsync/ssh processes.

use dialoguer::{FuzzySelect, Input};
use thiserror::Error;

/// Errors raised by interactive prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Raised when the terminal interaction fails.
    #[error("prompt interaction failed: {0}")]
    Io(String),
    /// Raised when host selection is requested with no hosts configured.
    #[error("no known hosts to select from; pass --remote-host or add one to host_cfg")]
    NoHosts,
}

/// Abstraction over user prompts to support fakes in tests.
pub trait Prompter {
    /// Asks the user to pick a remote host from the known host list.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::NoHosts`] when `hosts` is empty and
    /// [`PromptError::Io`] when the interaction fails.
    fn select_host(&self, hosts: &[String]) -> Result<String, PromptError>;

    /// Asks the user to edit the argument string, pre-filled with `current`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Io`] when the interaction fails.
    fn edit_args(&self, current: &str) -> Result<String, PromptError>;
}

/// Real prompter backed by `dialoguer` on the invoking terminal.
#[derive(Clone, Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select_host(&self, hosts: &[String]) -> Result<String, PromptError> {
        if hosts.is_empty() {
            return Err(PromptError::NoHosts);
        }

        let index = FuzzySelect::new()
            .with_prompt("Select remote host")
            .items(hosts)
            .default(0)
            .interact()
            .map_err(|err| PromptError::Io(err.to_string()))?;

        hosts
            .get(index)
            .cloned()
            .ok_or_else(|| PromptError::Io(String::from("selection index out of range")))
    }

    fn edit_args(&self, current: &str) -> Result<String, PromptError> {
        Input::<String>::new()
            .with_prompt("args")
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()
            .map_err(|err| PromptError::Io(err.to_string()))
    }
}
