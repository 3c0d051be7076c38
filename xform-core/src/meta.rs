//! Meta file loading.
//!
//! The meta file is a JSON document listing the transformations and libraries
//! a repository owns:
//!
//! ```text
//! {
//!   "transformations": [
//!     { "name": "...", "description": "...", "file": "code.js",
//!       "language": "javascript",
//!       "test-input-file": "events.json", "expected-output": "expected.json" }
//!   ],
//!   "libraries": [ { "name": "...", "file": "lib.js", "language": "javascript" } ]
//! }
//! ```
//!
//! Relative paths inside it are used as-is, i.e. relative to the working
//! directory of the process, not to the meta file.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::MetaError;
use crate::types::{EntityDefinition, EntityKind, Meta};

/// Load the meta file at `path`.
///
/// Returns `MetaError::MetaNotFound` if absent, `MetaError::Parse` (with path +
/// line context) if malformed, `MetaError::Invalid` if a definition has a
/// blank `name`, `file` or `language`. Absent `transformations` / `libraries`
/// keys load as empty lists.
pub fn load(path: &Path) -> Result<Meta, MetaError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(MetaError::MetaNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(err) => {
            return Err(MetaError::Io {
                path: path.to_path_buf(),
                source: err,
            })
        }
    };
    let meta = parse(&contents).map_err(|e| MetaError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(path, &meta)?;
    Ok(meta)
}

/// Parse meta file contents without touching the filesystem.
pub fn parse(contents: &str) -> Result<Meta, serde_json::Error> {
    serde_json::from_str(contents)
}

fn validate(path: &Path, meta: &Meta) -> Result<(), MetaError> {
    for kind in EntityKind::all() {
        for (index, def) in meta.definitions(*kind).iter().enumerate() {
            if let Some(reason) = blank_field(def) {
                return Err(MetaError::Invalid {
                    path: path.to_path_buf(),
                    kind: kind.as_str(),
                    index,
                    reason,
                });
            }
        }
    }
    Ok(())
}

fn blank_field(def: &EntityDefinition) -> Option<String> {
    if def.name.trim().is_empty() {
        return Some("`name` is empty".to_string());
    }
    if def.file.as_os_str().is_empty() {
        return Some(format!("`file` is empty for '{}'", def.name));
    }
    if def.language.trim().is_empty() {
        return Some(format!("`language` is empty for '{}'", def.name));
    }
    None
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_meta(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("meta.json");
        std::fs::write(&path, body).expect("write meta");
        path
    }

    #[test]
    fn missing_keys_load_as_empty_lists() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_meta(&dir, "{}");
        let meta = load(&path).expect("load");
        assert!(meta.transformations.is_empty());
        assert!(meta.libraries.is_empty());
    }

    #[test]
    fn only_libraries_present() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_meta(
            &dir,
            r#"{"libraries":[{"file":"lib1.js","name":"getFinanceData","language":"javascript"}]}"#,
        );
        let meta = load(&path).expect("load");
        assert!(meta.transformations.is_empty());
        assert_eq!(meta.libraries.len(), 1);
        assert_eq!(meta.libraries[0].name, "getFinanceData");
    }

    #[test]
    fn load_missing_file_returns_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, MetaError::MetaNotFound { .. }));
    }

    #[test]
    fn blank_name_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_meta(
            &dir,
            r#"{"transformations":[{"file":"code.js","name":"  ","language":"javascript"}]}"#,
        );
        let err = load(&path).unwrap_err();
        assert!(
            matches!(err, MetaError::Invalid { kind: "transformation", index: 0, .. }),
            "got: {err}"
        );
    }

    #[test]
    fn parse_is_pure() {
        let meta = parse(r#"{"transformations":[]}"#).expect("parse");
        assert_eq!(meta, Meta::default());
    }
}
