//! Atomic file writes.
//!
//! Files are written under a `.part` name next to their destination and
//! renamed into place once complete, so a crash or interrupt never leaves a
//! truncated file under the final name.

use crate::constants::output::PARTIAL_SUFFIX;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

/// In-progress path for `path`: `clip.wav` becomes `clip.wav.part`.
#[must_use]
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Run `write` against a partial path, then rename it to `path`.
///
/// The partial file is removed if `write` or the rename fails.
///
/// # Errors
///
/// Returns the error from `write`, or [`Error::WriteFailure`] if the rename
/// fails.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let partial = partial_path(path);

    let result = write(&partial).and_then(|()| {
        std::fs::rename(&partial, path).map_err(|e| Error::write_failure(path, e))
    });

    if result.is_err() {
        remove_partial(&partial);
    }
    result
}

fn remove_partial(partial: &Path) {
    match std::fs::remove_file(partial) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {e}", partial.display()),
    }
}
