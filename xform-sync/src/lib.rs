//! # xform-sync
//!
//! Upserts transformations and libraries into a remote workspace, runs their
//! tests, compares outputs with expected fixtures and publishes.
//!
//! Call [`run`] with a [`RunConfig`] and any [`Workspace`] implementation.
//! [`MemoryWorkspace`] is an in-process workspace for tests.

pub mod artifact;
pub mod compare;
pub mod diff;
pub mod error;
pub mod index;
pub mod memory;
pub mod pipeline;
pub mod reconcile;
pub mod runner;
pub mod suite;
pub mod workspace;
pub mod writer;

pub use artifact::{ArtifactReceipt, ArtifactStore, DirectoryArtifactStore, TEST_RESULTS_ARTIFACT};
pub use compare::{handle, Comparison};
pub use diff::{detailed_diff, json_eq, DetailedDiff};
pub use error::SyncError;
pub use index::NameIndex;
pub use memory::MemoryWorkspace;
pub use pipeline::{run, RunConfig, RunSummary, Stage};
pub use workspace::{EntityDraft, Operation, RemoteError, Workspace};
pub use writer::write_json;
