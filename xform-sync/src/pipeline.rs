//! Test-and-publish pipeline entrypoint used by the CLI.
//!
//! ```text
//! Loaded → Reconciled → SuiteBuilt → Tested → Compared → [Uploaded] → [Published] → Done
//! ```
//!
//! Any stage error ends the run; a new run starts again from the meta file.

use std::fmt;
use std::path::{Path, PathBuf};

use xform_core::{meta, ComparisonOutcome, EntityKind, RemoteEntity, TestSuite};

use crate::artifact::{ArtifactReceipt, ArtifactStore, TEST_RESULTS_ARTIFACT};
use crate::index::NameIndex;
use crate::workspace::{RemoteError, Workspace};
use crate::{compare, reconcile, runner, suite, SyncError};

/// Everything a run needs to know, resolved up front by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub meta_path: PathBuf,
    /// Directory receiving `<handle>_output.json` / `<handle>_diff.json`.
    pub output_dir: PathBuf,
    /// Skip publishing.
    pub test_only: bool,
    /// Upload output and diff files after comparison.
    pub upload_artifact: bool,
    /// Commit the published versions are tagged with.
    pub commit_id: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            meta_path: PathBuf::from("meta.json"),
            output_dir: PathBuf::from("./test-outputs"),
            test_only: true,
            upload_artifact: false,
            commit_id: String::new(),
        }
    }
}

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loaded,
    Reconciled,
    SuiteBuilt,
    Tested,
    Compared,
    Uploaded,
    Published,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Loaded => "loaded",
            Stage::Reconciled => "reconciled",
            Stage::SuiteBuilt => "suite built",
            Stage::Tested => "tested",
            Stage::Compared => "compared",
            Stage::Uploaded => "uploaded",
            Stage::Published => "published",
            Stage::Done => "done",
        };
        f.write_str(label)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub transformations: usize,
    pub libraries: usize,
    pub tests_passed: usize,
    pub comparisons: Vec<ComparisonOutcome>,
    pub output_files: Vec<PathBuf>,
    pub artifact: Option<ArtifactReceipt>,
    pub suite: TestSuite,
    pub published: bool,
}

/// Run the whole pipeline.
///
/// `artifacts` is only consulted when `config.upload_artifact` is set; asking
/// for an upload without a store is an error. On failure the last stage
/// reached and the error are logged before the error is returned.
pub fn run(
    config: &RunConfig,
    workspace: &dyn Workspace,
    artifacts: Option<&dyn ArtifactStore>,
) -> Result<RunSummary, SyncError> {
    tracing::info!("starting test and publish of transformations and libraries");
    let mut stage = None;
    match run_stages(config, workspace, artifacts, &mut stage) {
        Ok(summary) => {
            tracing::info!("successfully executed the workflow");
            Ok(summary)
        }
        Err(err) => {
            let reached = stage.map(|s: Stage| s.to_string());
            tracing::error!(
                "run failed after stage '{}': {err}",
                reached.as_deref().unwrap_or("start")
            );
            Err(err)
        }
    }
}

fn run_stages(
    config: &RunConfig,
    workspace: &dyn Workspace,
    artifacts: Option<&dyn ArtifactStore>,
    stage: &mut Option<Stage>,
) -> Result<RunSummary, SyncError> {
    let mut advance = |next: Stage| {
        tracing::debug!("stage: {next}");
        *stage = Some(next);
    };

    tracing::info!(
        "loading transformations and libraries from: {}",
        config.meta_path.display()
    );
    let meta = meta::load(&config.meta_path)?;
    advance(Stage::Loaded);

    let (remote_transformations, remote_libraries) = list_remote(workspace)?;
    let transformation_index =
        NameIndex::build(EntityKind::Transformation, &remote_transformations)?;
    let library_index = NameIndex::build(EntityKind::Library, &remote_libraries)?;

    let transformations =
        reconcile::upsert(workspace, &transformation_index, &meta.transformations)?;
    let libraries = reconcile::upsert(workspace, &library_index, &meta.libraries)?;
    advance(Stage::Reconciled);

    let suite = suite::build(&transformations, &libraries)?;
    advance(Stage::SuiteBuilt);

    let result = runner::run(workspace, &suite)?;
    advance(Stage::Tested);

    let comparison = compare::compare(
        &result.success_test_results,
        &transformations,
        &config.output_dir,
    )?;
    advance(Stage::Compared);

    let mut artifact = None;
    if config.upload_artifact {
        let store = artifacts.ok_or_else(|| {
            SyncError::Artifact("upload requested but no artifact store configured".to_string())
        })?;
        tracing::info!("uploading test artifacts");
        artifact = Some(store.upload(
            TEST_RESULTS_ARTIFACT,
            &comparison.output_files,
            upload_root(&config.output_dir),
        )?);
        advance(Stage::Uploaded);
    }

    if !comparison.mismatches.is_empty() {
        return Err(SyncError::OutputMismatch {
            messages: comparison.mismatches,
        });
    }

    let published = !config.test_only;
    if published {
        tracing::info!("publishing transformations and libraries");
        workspace.publish(&suite, &config.commit_id)?;
        advance(Stage::Published);
    }
    advance(Stage::Done);

    Ok(RunSummary {
        transformations: transformations.len(),
        libraries: libraries.len(),
        tests_passed: result.success_test_results.len(),
        comparisons: comparison.outcomes,
        output_files: comparison.output_files,
        artifact,
        suite,
        published,
    })
}

/// Uploaded files keep the output directory's own name as their first path
/// component, wherever that directory lives.
fn upload_root(output_dir: &Path) -> &Path {
    output_dir.parent().unwrap_or(output_dir)
}

/// List transformations and libraries concurrently.
fn list_remote(
    workspace: &dyn Workspace,
) -> Result<(Vec<RemoteEntity>, Vec<RemoteEntity>), RemoteError> {
    std::thread::scope(|scope| {
        let transformations = scope.spawn(|| {
            tracing::info!("getting all transformations from upstream");
            workspace.list(EntityKind::Transformation)
        });
        tracing::info!("getting all libraries from upstream");
        let libraries = workspace.list(EntityKind::Library);
        let transformations = match transformations.join() {
            Ok(listed) => listed,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        Ok((transformations?, libraries?))
    })
}
