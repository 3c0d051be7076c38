//! Atomic writer for output and diff files.
//!
//! ## `write_json` — write protocol
//!
//! 1. Serialize the value as pretty JSON (2-space indent).
//! 2. Ensure the parent directory exists.
//! 3. Write to `<path>.xform.tmp`.
//! 4. Rename to the final path (atomic on POSIX); remove the tmp file if the
//!    rename fails.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{io_err, SyncError};

/// Atomically write `value` as pretty-printed JSON to `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SyncError> {
    let tmp = PathBuf::from(format!("{}.xform.tmp", path.display()));
    write_json_with_tmp(path, value, &tmp)
}

fn write_json_with_tmp<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    tmp: &Path,
) -> Result<(), SyncError> {
    let content = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
