//! Layered merge of the persisted document into one runtime view.
//!
//! Resolution overlays four layers in order (built-in defaults, `global`,
//! the host leaf, the target leaf) and then applies CLI overrides. Later layers
//! override earlier keys; the merge is shallow, never recursive. Resolution
//! is also the only place the document is mutated: it ensures the target
//! leaf exists, writes the sticky `args`/`interpreter` values back, applies
//! `auto_add_hosts`, and records the chosen host as `mru_host`.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::{Document, TargetKey};
use crate::prompt::{PromptError, Prompter};

/// Interpreter used when no layer configures one.
pub const DEFAULT_INTERPRETER: &str = "python3";
/// Remote directory receiving project mirrors when none is configured.
pub const DEFAULT_REMOTE_BASE_DIR: &str = "/tmp";
/// Transfer options used when no layer configures any.
pub const DEFAULT_TRANSFER_OPTIONS: [&str; 3] = ["--archive", "--compress", "--delete"];

/// Fully-merged options for one invocation.
///
/// Never persisted as a whole; only `args` and `interpreter` are written
/// back into the document's target leaf.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interpreter launched on the remote host.
    pub interpreter: String,
    /// Fallback project roots consulted when VCS root discovery fails.
    pub project_roots: Vec<Utf8PathBuf>,
    /// Whether resolution creates host entries for unknown hosts.
    pub auto_add_hosts: bool,
    /// Options passed to the transfer tool.
    pub rsync_options: Vec<String>,
    /// Remote directory the project tree is mirrored under.
    pub remote_base_dir: Utf8PathBuf,
    /// Reserved; carried through the merge but not consumed yet.
    pub close: bool,
    /// Whether the host is selected interactively.
    pub prompt: bool,
    /// Whether transfer output is verbose.
    pub verbose: bool,
    /// Whether resolution results are persisted back to disk.
    pub allow_config_updates: bool,
    /// Argument string appended to the remote command line.
    pub args: Option<String>,
    /// Test selector appended to the remote script path.
    pub test: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: String::from(DEFAULT_INTERPRETER),
            project_roots: Vec::new(),
            auto_add_hosts: true,
            rsync_options: DEFAULT_TRANSFER_OPTIONS
                .iter()
                .map(|opt| String::from(*opt))
                .collect(),
            remote_base_dir: Utf8PathBuf::from(DEFAULT_REMOTE_BASE_DIR),
            close: true,
            prompt: false,
            verbose: false,
            allow_config_updates: true,
            args: None,
            test: None,
        }
    }
}

/// Explicit per-invocation overrides taken from the command line.
///
/// Flags overlay the merged configuration only when set; absent values leave
/// the persisted layers untouched.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    /// `-v/--verbose` flag.
    pub verbose: bool,
    /// `-p/--prompt` flag.
    pub prompt: bool,
    /// `-a/--args` value.
    pub args: Option<String>,
    /// `-i/--interpreter` value.
    pub interpreter: Option<String>,
    /// `-e/--edit-args` flag.
    pub edit_args: bool,
    /// `-t/--test` value.
    pub test: Option<String>,
}

/// Errors raised during resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Raised when a configuration layer holds values of the wrong type.
    #[error("failed to merge configuration layers: {0}")]
    Merge(String),
    /// Raised when the interactive args editor fails.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Merges all layers for `host` and `target` and mutates `document` in
/// place: the target leaf is created on demand, sticky values are written
/// back, and `mru_host` is updated to `host`.
///
/// Resolving twice with the same inputs yields an identical result; all
/// document mutations are idempotent.
///
/// # Errors
///
/// Returns [`ResolveError::Merge`] when a layer holds malformed values and
/// [`ResolveError::Prompt`] when interactive args editing fails.
pub fn resolve<P: Prompter>(
    document: &mut Document,
    overrides: &CliOverrides,
    host: &str,
    target: &TargetKey,
    prompter: &P,
) -> Result<RuntimeConfig, ResolveError> {
    let mut merged = defaults_layer()?;
    overlay(&mut merged, &document.global);
    if let Some(entry) = document.host_cfg.get(host) {
        overlay(&mut merged, &entry.overrides);
        if let Some(leaf) = entry.scripts.get(&target.storage_key()) {
            overlay(&mut merged, leaf);
        }
    }

    let mut runtime: RuntimeConfig = serde_json::from_value(Value::Object(merged))
        .map_err(|err| ResolveError::Merge(err.to_string()))?;

    apply_overrides(&mut runtime, overrides, prompter)?;

    let leaf = document.target_leaf_mut(host, target);
    if let Some(args) = &runtime.args {
        leaf.insert(String::from("args"), Value::String(args.clone()));
    }
    leaf.insert(
        String::from("interpreter"),
        Value::String(runtime.interpreter.clone()),
    );

    if runtime.auto_add_hosts {
        document.host_entry_mut(host);
    }

    document.mru_host = Some(host.to_owned());

    Ok(runtime)
}

/// Applies CLI fields in fixed precedence: verbose, prompt, args,
/// interpreter, then the interactive args edit last.
fn apply_overrides<P: Prompter>(
    runtime: &mut RuntimeConfig,
    overrides: &CliOverrides,
    prompter: &P,
) -> Result<(), ResolveError> {
    if overrides.verbose {
        runtime.verbose = true;
    }
    if overrides.prompt {
        runtime.prompt = true;
    }
    if let Some(args) = &overrides.args
        && !args.is_empty()
    {
        runtime.args = Some(args.clone());
    }
    if let Some(interpreter) = &overrides.interpreter {
        runtime.interpreter = interpreter.clone();
    }
    if overrides.edit_args {
        let current = runtime.args.clone().unwrap_or_default();
        runtime.args = Some(prompter.edit_args(&current)?);
    }
    if let Some(test) = &overrides.test {
        runtime.test = Some(test.clone());
    }
    Ok(())
}

fn defaults_layer() -> Result<Map<String, Value>, ResolveError> {
    match serde_json::to_value(RuntimeConfig::default()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ResolveError::Merge(format!(
            "defaults rendered as {other}, expected an object"
        ))),
        Err(err) => Err(ResolveError::Merge(err.to_string())),
    }
}

fn overlay(base: &mut Map<String, Value>, layer: &Map<String, Value>) {
    for (key, value) in layer {
        base.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests;
