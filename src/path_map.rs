//! Maps local file paths onto the remote mirror tree.

use camino::{Utf8Path, Utf8PathBuf};

/// Computes the remote mirror path of `local`.
///
/// The path is taken relative to the *parent* of `project_root`, so the
/// project directory name itself is preserved on the remote side, then
/// prefixed with `remote_base_dir`. Pure string manipulation; no filesystem
/// access. When `local` does not lie under the project root's parent the
/// prefix removal is a no-op and the result may be nonsensical; a known
/// limitation, not silently corrected.
#[must_use]
pub fn remote_path(
    local: &Utf8Path,
    project_root: &Utf8Path,
    remote_base_dir: &Utf8Path,
) -> Utf8PathBuf {
    let anchor = project_root.parent().map_or("", Utf8Path::as_str);
    let relative = local.as_str().strip_prefix(anchor).unwrap_or(local.as_str());
    Utf8PathBuf::from(format!("{remote_base_dir}{relative}"))
}
