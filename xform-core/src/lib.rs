//! xform core library — domain types, meta file loading, errors.
//!
//! - [`types`] — newtypes, meta definitions, remote wire shapes
//! - [`error`] — [`MetaError`]
//! - [`meta`] — load and validate the meta file

pub mod error;
pub mod meta;
pub mod types;

pub use error::MetaError;
pub use types::{
    ComparisonOutcome, EntityDefinition, EntityId, EntityKind, LibraryTest, Meta, RemoteEntity,
    TestResult, TestSuite, TestSuiteResult, TransformationTest, VersionId, VersionMap,
    VersionedEntity, WriteReceipt,
};
