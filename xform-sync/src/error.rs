//! Error types for xform-sync.

use std::path::PathBuf;

use thiserror::Error;

use xform_core::{EntityKind, MetaError, TestResult, VersionId};

use crate::workspace::RemoteError;

/// All errors that can arise from a test-and-publish run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The meta file is missing, malformed or invalid.
    #[error("meta error: {0}")]
    Meta(#[from] MetaError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A test-input or expected-output fixture is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A listed remote entity lacks a field the name index needs.
    #[error("remote {kind} #{index} is missing `{field}`")]
    MissingRemoteField {
        kind: EntityKind,
        index: usize,
        field: &'static str,
    },

    /// Two remote entities of the same kind share a name.
    #[error("remote workspace has more than one {kind} named '{name}'")]
    DuplicateRemoteName { kind: EntityKind, name: String },

    /// The registry handed out the same version id twice in one run.
    #[error("{kind} '{name}' was assigned version {version_id}, already used by '{existing}'")]
    DuplicateVersion {
        kind: EntityKind,
        name: String,
        existing: String,
        version_id: VersionId,
    },

    /// A call to the remote workspace failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A successful test result came back without transformed events.
    #[error("test result for version {version_id} has no output.transformedEvents")]
    MissingOutput { version_id: VersionId },

    /// The remote test engine reported failures.
    #[error("Failures occurred while running tests against input events ({} failed)", .failed.len())]
    TestFailure { failed: Vec<TestResult> },

    /// Actual output differed from one or more expected-output fixtures.
    #[error("{}", .messages.join(", "))]
    OutputMismatch { messages: Vec<String> },

    /// Uploading test artifacts failed.
    #[error("artifact upload failed: {0}")]
    Artifact(String),

    /// JSON serialization error while writing outputs or manifests.
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Json`].
pub(crate) fn json_err(path: impl Into<PathBuf>, source: serde_json::Error) -> SyncError {
    SyncError::Json {
        path: path.into(),
        source,
    }
}
