//! Test artifact upload.
//!
//! [`DirectoryArtifactStore`] stages artifacts on disk at
//! `<root>/<artifact_name>/` together with a `manifest.json`:
//!
//! ```text
//! {
//!   "name": "transformer-test-results",
//!   "created_at": "2024-01-01T00:00:00Z",
//!   "files": [ { "path": "test-outputs/t1_output.json", "bytes": 123, "sha256": "…" } ]
//! }
//! ```
//!
//! Files keep their path relative to the upload root, so uploading
//! `./test-outputs/t1_output.json` from `.` stages
//! `<root>/<artifact_name>/test-outputs/t1_output.json`.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};
use crate::writer::write_json;

/// Name under which test outputs are uploaded.
pub const TEST_RESULTS_ARTIFACT: &str = "transformer-test-results";

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReceipt {
    pub id: String,
    pub location: PathBuf,
    pub files: usize,
}

/// Destination for test artifacts.
pub trait ArtifactStore {
    /// Upload `files` under `name`. Paths are stored relative to `root`.
    fn upload(&self, name: &str, files: &[PathBuf], root: &Path)
        -> Result<ArtifactReceipt, SyncError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<ManifestEntry>,
}

/// Stages artifacts in a local directory for the CI runner to pick up.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactStore {
    root: PathBuf,
}

impl DirectoryArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for DirectoryArtifactStore {
    fn upload(
        &self,
        name: &str,
        files: &[PathBuf],
        root: &Path,
    ) -> Result<ArtifactReceipt, SyncError> {
        let created_at = Utc::now();
        let location = self.root.join(name);
        std::fs::create_dir_all(&location).map_err(|e| io_err(&location, e))?;

        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let relative = relative_to(file, root)?;
            let bytes = std::fs::read(file).map_err(|e| io_err(file, e))?;
            let target = location.join(&relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            std::fs::write(&target, &bytes).map_err(|e| io_err(&target, e))?;

            let digest = {
                let mut h = Sha256::new();
                h.update(&bytes);
                hex::encode(h.finalize())
            };
            tracing::debug!("staged artifact file: {}", relative.display());
            entries.push(ManifestEntry {
                path: relative.to_string_lossy().replace('\\', "/"),
                bytes: bytes.len() as u64,
                sha256: digest,
            });
        }

        let manifest = Manifest {
            name: name.to_string(),
            created_at,
            files: entries,
        };
        write_json(&location.join("manifest.json"), &manifest)?;

        let id = format!("{name}-{}", created_at.format("%Y%m%dT%H%M%SZ"));
        tracing::info!("test artifact uploaded with id: {id}");
        Ok(ArtifactReceipt {
            id,
            location,
            files: manifest.files.len(),
        })
    }
}

/// `file` relative to `root`, normalised and refusing to escape it.
fn relative_to(file: &Path, root: &Path) -> Result<PathBuf, SyncError> {
    let stripped = file.strip_prefix(root).unwrap_or(file);
    let mut relative = PathBuf::new();
    for component in stripped.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(SyncError::Artifact(format!(
                    "{} is outside the upload root {}",
                    file.display(),
                    root.display()
                )))
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(SyncError::Artifact(format!(
            "{} does not name a file",
            file.display()
        )));
    }
    Ok(relative)
}
