//! Error types for xform-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading the meta file.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Underlying I/O failure other than a missing file (permission denied, etc.).
    #[error("failed to read meta file at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error on load, with file path and line context from serde_json.
    #[error("failed to parse meta file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The meta file did not exist at the given path.
    #[error("meta file not found at {path}")]
    MetaNotFound { path: PathBuf },

    /// A definition is present but unusable (blank name, file or language).
    #[error("invalid {kind} #{index} in {path}: {reason}")]
    Invalid {
        path: PathBuf,
        kind: &'static str,
        index: usize,
        reason: String,
    },
}
