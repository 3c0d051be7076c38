//! The remote workspace contract.
//!
//! Everything the pipeline needs from the service that stores and executes
//! transformations and libraries. The CLI provides the HTTP implementation;
//! tests provide in-memory ones.

use std::fmt;

use thiserror::Error;

use xform_core::{EntityId, EntityKind, RemoteEntity, TestSuite, TestSuiteResult, WriteReceipt};

/// Remote operation names, used for error context and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List(EntityKind),
    Create(EntityKind),
    Update(EntityKind),
    Test,
    Publish,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List(EntityKind::Transformation) => write!(f, "list transformations"),
            Operation::List(EntityKind::Library) => write!(f, "list libraries"),
            Operation::Create(kind) => write!(f, "create {kind}"),
            Operation::Update(kind) => write!(f, "update {kind}"),
            Operation::Test => write!(f, "test"),
            Operation::Publish => write!(f, "publish"),
        }
    }
}

/// A failed call to the remote workspace.
#[derive(Debug, Error)]
#[error("{operation} failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
pub struct RemoteError {
    pub operation: Operation,
    /// HTTP status, when the server answered at all.
    pub status: Option<u16>,
    /// Response body or transport error text.
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: Operation, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            operation,
            status,
            message: message.into(),
        }
    }
}

/// Fields sent on create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDraft<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub code: &'a str,
    pub language: &'a str,
}

/// Remote store/executor of transformations and libraries.
///
/// `Sync` so the two list calls can run on scoped threads.
pub trait Workspace: Sync {
    fn list(&self, kind: EntityKind) -> Result<Vec<RemoteEntity>, RemoteError>;

    fn create(&self, kind: EntityKind, draft: &EntityDraft<'_>)
        -> Result<WriteReceipt, RemoteError>;

    fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        draft: &EntityDraft<'_>,
    ) -> Result<WriteReceipt, RemoteError>;

    /// Run every transformation and library in `suite` in one call.
    fn test(&self, suite: &TestSuite) -> Result<TestSuiteResult, RemoteError>;

    /// Promote the versions in `suite` to published, tagged with `commit_id`.
    fn publish(&self, suite: &TestSuite, commit_id: &str) -> Result<(), RemoteError>;
}
