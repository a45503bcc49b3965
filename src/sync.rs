//! rsync mirroring and attached SSH sessions.
//!
//! The sync module shells out to the system `rsync` binary to mirror the
//! local project root under the remote base directory, then wraps the
//! system `ssh` client to run the remote command as an attached interactive
//! session. Both processes inherit the invoking terminal's standard
//! streams; a hung remote command blocks indefinitely.

use std::ffi::OsString;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Transfer flags recognised as enabling verbose output.
pub const VERBOSE_FLAGS: [&str; 2] = ["-v", "--verbose"];

/// Result of running an external command with captured output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, SyncError>;

    /// Runs `program` attached to the invoking terminal and returns its exit
    /// code, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Spawn`] if the command cannot be started.
    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, SyncError>;
}

/// Real command runner that shells out to the host operating system.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, SyncError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| SyncError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, SyncError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|err| SyncError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(status.code())
    }
}

/// Errors surfaced while mirroring or running the remote session.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SyncError {
    /// Raised when the local source path is absent.
    #[error("sync source missing: {path}")]
    MissingSource {
        /// Path that was expected to be mirrored.
        path: Utf8PathBuf,
    },
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when `rsync` completes with a non-zero exit code.
    #[error("{program} exited with status {status_text}")]
    CommandFailure {
        /// Command name used for the attempted operation.
        program: String,
        /// Human readable representation of the exit status.
        status_text: String,
    },
    /// Raised when the SSH session finishes without yielding an exit status.
    #[error("{program} did not return an exit code")]
    MissingExitCode {
        /// Command that completed without a status.
        program: String,
    },
}

/// Appends `--verbose` to the option list unless a verbose-equivalent flag
/// is already present. Idempotent: calling twice never appends twice.
pub fn ensure_verbose(options: &mut Vec<String>) {
    let already_verbose = options
        .iter()
        .any(|opt| VERBOSE_FLAGS.contains(&opt.as_str()));
    if !already_verbose {
        options.push(String::from("--verbose"));
    }
}

/// Mirrors the project tree and runs the attached remote session.
#[derive(Clone, Debug)]
pub struct Syncer<R: CommandRunner> {
    rsync_bin: String,
    ssh_bin: String,
    runner: R,
}

impl<R: CommandRunner> Syncer<R> {
    /// Creates a syncer over the system `rsync` and `ssh` binaries.
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            rsync_bin: String::from("rsync"),
            ssh_bin: String::from("ssh"),
            runner,
        }
    }

    /// Mirrors `source` (one-way, delete-extraneous by default via the
    /// configured options) to `remote_base_dir` on `host`.
    ///
    /// The source directory itself is copied, not its contents, so the
    /// project directory name survives on the remote side. When `verbose` is
    /// set a verbose flag is appended to the options unless one is already
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingSource`] when `source` is absent and
    /// [`SyncError::CommandFailure`] when `rsync` exits non-zero.
    pub fn mirror(
        &self,
        source: &Utf8Path,
        host: &str,
        remote_base_dir: &Utf8Path,
        options: &[String],
        verbose: bool,
    ) -> Result<(), SyncError> {
        if !source.as_std_path().exists() {
            return Err(SyncError::MissingSource {
                path: source.to_path_buf(),
            });
        }

        let mut transfer_options = options.to_vec();
        if verbose {
            ensure_verbose(&mut transfer_options);
        }

        let mut args: Vec<OsString> = transfer_options.into_iter().map(OsString::from).collect();
        args.push(OsString::from(source.as_str()));
        args.push(OsString::from(format!("{host}:{remote_base_dir}")));

        let code = self.runner.run_attached(&self.rsync_bin, &args)?;
        if code == Some(0) {
            return Ok(());
        }

        Err(SyncError::CommandFailure {
            program: self.rsync_bin.clone(),
            status_text: code.map_or_else(|| String::from("unknown"), |value| value.to_string()),
        })
    }

    /// Runs `remote_command` on `host` as an attached interactive session
    /// (`ssh -tt`) and returns the remote exit code.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingExitCode`] when the session ends without
    /// a code (for example, when terminated by a signal).
    pub fn run_session(&self, host: &str, remote_command: &str) -> Result<i32, SyncError> {
        let args = vec![
            OsString::from("-tt"),
            OsString::from(host),
            OsString::from(remote_command),
        ];

        let code = self.runner.run_attached(&self.ssh_bin, &args)?;
        code.ok_or_else(|| SyncError::MissingExitCode {
            program: self.ssh_bin.clone(),
        })
    }
}
