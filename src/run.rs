//! Orchestrates configuration resolution, mirroring, and the remote session.
//!
//! The sequencing invariant lives here: configuration is persisted before
//! any remote I/O, so a sync or execute failure never leaves unsaved config
//! changes and a successful save never depends on remote operations.

use camino::{Utf8Path, Utf8PathBuf};
use shell_escape::unix::escape;
use thiserror::Error;

use crate::config_store::{ConfigStore, ConfigStoreError};
use crate::document::{Document, TargetKey};
use crate::path_map::remote_path;
use crate::project_root::ProjectLocator;
use crate::prompt::{PromptError, Prompter};
use crate::resolver::{self, CliOverrides, ResolveError, RuntimeConfig};
use crate::sync::{CommandRunner, SyncError, Syncer};

/// Separator between a remote script path and its test selector.
pub const TEST_SELECTOR_SEPARATOR: &str = "::";

/// What to run remotely; exactly one variant is active per invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExecutionTarget {
    /// A script addressed by its local file path.
    Script {
        /// Local source file to run.
        path: Utf8PathBuf,
        /// Optional test selector appended to the remote path.
        test: Option<String>,
    },
    /// A module run from the current working directory.
    Module {
        /// Module name passed to the interpreter's `-m` flag.
        name: String,
    },
}

/// Errors surfaced while planning or performing a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Raised when neither or both of a source file and a module are given.
    #[error("supply exactly one of a source file or --module")]
    AmbiguousTarget,
    /// Raised when the resolved local path does not exist on disk.
    #[error("local path does not exist: {path}")]
    PathNotFound {
        /// Path that was expected to exist.
        path: Utf8PathBuf,
    },
    /// Raised when no host flag, prompt, or MRU host is available.
    #[error("no remote host given and no most-recently-used host recorded")]
    HostUnresolved,
    /// Raised when the current working directory is unavailable or not UTF-8.
    #[error("current working directory is unusable: {0}")]
    WorkingDir(String),
    /// Raised when loading or persisting the configuration fails.
    #[error(transparent)]
    Store(#[from] ConfigStoreError),
    /// Raised when configuration resolution fails.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Raised when an interactive prompt fails.
    #[error(transparent)]
    Prompt(#[from] PromptError),
    /// Raised when mirroring or the remote session fails.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Decides the execution target from the mutually exclusive CLI pair.
///
/// The argument parser enforces the exclusivity too; this keeps the
/// invariant with the core.
///
/// # Errors
///
/// Returns [`RunError::AmbiguousTarget`] when both or neither are given.
pub fn plan(
    source_file: Option<Utf8PathBuf>,
    module: Option<String>,
    test: Option<String>,
) -> Result<ExecutionTarget, RunError> {
    match (source_file, module) {
        (Some(path), None) => Ok(ExecutionTarget::Script { path, test }),
        (None, Some(name)) => Ok(ExecutionTarget::Module { name }),
        _ => Err(RunError::AmbiguousTarget),
    }
}

/// One invocation's worth of planning input.
#[derive(Clone, Debug)]
pub struct RunRequest {
    /// Target to execute remotely.
    pub target: ExecutionTarget,
    /// Explicit host flag; short-circuits prompt and MRU lookup.
    pub remote_host: Option<String>,
    /// CLI overrides applied during resolution.
    pub overrides: CliOverrides,
}

/// Executes the sync-then-execute flow with injected collaborators.
#[derive(Debug)]
pub struct RunOrchestrator<R: CommandRunner, P: Prompter> {
    store: ConfigStore,
    syncer: Syncer<R>,
    locator: ProjectLocator<R>,
    prompter: P,
}

impl<R, P> RunOrchestrator<R, P>
where
    R: CommandRunner + Clone,
    P: Prompter,
{
    /// Creates a new orchestrator sharing `runner` between sync and VCS
    /// lookup.
    #[must_use]
    pub fn new(store: ConfigStore, runner: R, prompter: P) -> Self {
        Self {
            store,
            syncer: Syncer::new(runner.clone()),
            locator: ProjectLocator::new(runner),
            prompter,
        }
    }

    /// Runs the full flow and returns the remote session's exit code.
    ///
    /// Order is strict: load, resolve (mutating the document), persist when
    /// allowed, mirror, execute. Nothing after the persist step can corrupt
    /// the saved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when any step fails; all failures are fatal and
    /// unrecovered.
    pub fn execute(&self, request: &RunRequest) -> Result<i32, RunError> {
        let (mut document, config_path) = self.store.load()?;

        let local_path = local_anchor(&request.target)?;
        if !local_path.as_std_path().exists() {
            return Err(RunError::PathNotFound { path: local_path });
        }

        let host = self.choose_host(&document, request)?;
        let target_key = target_key_for(&request.target, &local_path);
        let runtime = resolver::resolve(
            &mut document,
            &request.overrides,
            &host,
            &target_key,
            &self.prompter,
        )?;

        let project_root = self.locator.locate(&local_path, &runtime.project_roots);

        if runtime.allow_config_updates {
            self.store.persist(&config_path, &document)?;
        }

        self.syncer.mirror(
            &project_root,
            &host,
            &runtime.remote_base_dir,
            &runtime.rsync_options,
            runtime.verbose,
        )?;

        let command = remote_command(&request.target, &local_path, &project_root, &runtime);
        Ok(self.syncer.run_session(&host, &command)?)
    }

    /// Chooses the host from exactly one source, in priority order: the
    /// explicit flag, interactive selection, the persisted MRU host.
    fn choose_host(&self, document: &Document, request: &RunRequest) -> Result<String, RunError> {
        if let Some(host) = &request.remote_host {
            return Ok(host.clone());
        }
        if request.overrides.prompt {
            return Ok(self.prompter.select_host(&document.known_hosts())?);
        }
        document.mru_host.clone().ok_or(RunError::HostUnresolved)
    }
}

fn local_anchor(target: &ExecutionTarget) -> Result<Utf8PathBuf, RunError> {
    let cwd = std::env::current_dir().map_err(|err| RunError::WorkingDir(err.to_string()))?;
    let cwd_utf8 = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|path| RunError::WorkingDir(path.display().to_string()))?;

    match target {
        ExecutionTarget::Module { .. } => Ok(cwd_utf8),
        ExecutionTarget::Script { path, .. } => {
            if path.is_absolute() {
                Ok(path.clone())
            } else {
                Ok(cwd_utf8.join(path))
            }
        }
    }
}

fn target_key_for(target: &ExecutionTarget, local_path: &Utf8Path) -> TargetKey {
    match target {
        ExecutionTarget::Script { .. } => TargetKey::Plain(local_path.to_path_buf()),
        ExecutionTarget::Module { name } => TargetKey::WithModule {
            dir: local_path.to_path_buf(),
            module: name.clone(),
        },
    }
}

/// Assembles the remote command line executed inside the SSH session.
fn remote_command(
    target: &ExecutionTarget,
    local_path: &Utf8Path,
    project_root: &Utf8Path,
    runtime: &RuntimeConfig,
) -> String {
    let mut command = match target {
        ExecutionTarget::Module { name } => {
            let remote_root = remote_path(project_root, project_root, &runtime.remote_base_dir);
            format!(
                "cd {} && {} -m {}",
                escape(remote_root.as_str().into()),
                runtime.interpreter,
                escape(name.as_str().into()),
            )
        }
        ExecutionTarget::Script { test, .. } => {
            let remote_file = remote_path(local_path, project_root, &runtime.remote_base_dir);
            let remote_dir = remote_file
                .parent()
                .map_or_else(|| Utf8PathBuf::from("/"), Utf8Path::to_path_buf);
            // A flag-supplied selector wins over one stored in the document.
            let selector = test.as_ref().or(runtime.test.as_ref());
            let script_arg = selector.map_or_else(
                || remote_file.as_str().to_owned(),
                |selector| format!("{remote_file}{TEST_SELECTOR_SEPARATOR}{selector}"),
            );
            format!(
                "cd {} && {} {}",
                escape(remote_dir.as_str().into()),
                runtime.interpreter,
                escape(script_arg.into()),
            )
        }
    };

    if let Some(args) = &runtime.args
        && !args.is_empty()
    {
        command.push(' ');
        command.push_str(args);
    }

    command
}
