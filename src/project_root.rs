//! Project root discovery for the sync mirror.
//!
//! The VCS lookup shells out to `git rev-parse --show-toplevel`. When the
//! target is not inside a repository the configured `project_roots` act as a
//! fallback search list, and when none of those match either, the target
//! path itself becomes the root, which makes the remote mirror a
//! single-file copy for bare scripts.

use std::ffi::OsString;

use camino::{Utf8Path, Utf8PathBuf};

use crate::sync::CommandRunner;

/// Resolves the local project root for a target path.
#[derive(Clone, Debug)]
pub struct ProjectLocator<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> ProjectLocator<R> {
    /// Creates a locator over the given command runner.
    pub const fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Returns the project root for `path`.
    ///
    /// Consults the VCS first, then the first entry of `fallback_roots` that
    /// is a prefix of `path`, then `path` itself.
    #[must_use]
    pub fn locate(&self, path: &Utf8Path, fallback_roots: &[Utf8PathBuf]) -> Utf8PathBuf {
        if let Some(root) = self.vcs_toplevel(path) {
            return root;
        }

        for root in fallback_roots {
            if path.as_str().starts_with(root.as_str()) {
                return root.clone();
            }
        }

        path.to_path_buf()
    }

    fn vcs_toplevel(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        let dir = if path.is_dir() { path } else { path.parent()? };
        let args = vec![
            OsString::from("-C"),
            OsString::from(dir.as_str()),
            OsString::from("rev-parse"),
            OsString::from("--show-toplevel"),
        ];

        let output = self.runner.run("git", &args).ok()?;
        if !output.is_success() {
            return None;
        }

        let top = output.stdout.lines().next()?.trim();
        if top.is_empty() {
            return None;
        }
        Some(Utf8PathBuf::from(top))
    }
}
