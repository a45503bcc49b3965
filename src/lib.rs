//! Core library for the remex remote execution tool.
//!
//! remex lets a developer edit source files locally and run them on a remote
//! host: it resolves a layered JSON configuration (built-in defaults →
//! global → host → target → CLI flags), mirrors the local project tree to
//! the host with rsync, and launches the script or module in an attached
//! SSH session with the resolved interpreter and arguments.

pub mod config_store;
pub mod document;
pub mod path_map;
pub mod project_root;
pub mod prompt;
pub mod resolver;
pub mod run;
pub mod sync;
#[cfg(test)]
mod test_support;

pub use config_store::{ConfigStore, ConfigStoreError};
pub use document::{Document, HostEntry, TargetKey};
pub use path_map::remote_path;
pub use project_root::ProjectLocator;
pub use prompt::{PromptError, Prompter, TerminalPrompter};
pub use resolver::{CliOverrides, ResolveError, RuntimeConfig, resolve};
pub use run::{ExecutionTarget, RunError, RunOrchestrator, RunRequest, plan};
pub use sync::{CommandOutput, CommandRunner, ProcessCommandRunner, SyncError, Syncer};
