//! In-process [`Workspace`] that keeps entities in memory and records every
//! call made against it.
//!
//! Version ids are handed out sequentially per write. Unless a canned result
//! is installed with [`MemoryWorkspace::respond_with`], `test` echoes each
//! transformation's `testInput` back as its transformed events.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::{json, Value};

use xform_core::{
    EntityId, EntityKind, RemoteEntity, TestResult, TestSuite, TestSuiteResult, VersionId,
    WriteReceipt,
};

use crate::workspace::{EntityDraft, Operation, RemoteError, Workspace};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(EntityKind),
    Create { kind: EntityKind, name: String },
    Update { kind: EntityKind, id: EntityId },
    Test,
    Publish { commit_id: String },
}

/// A stored entity with the last code written to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntity {
    pub id: EntityId,
    pub name: String,
    pub version_id: VersionId,
    pub description: String,
    pub code: String,
    pub language: String,
}

#[derive(Debug, Default)]
struct State {
    entities: HashMap<EntityKind, Vec<StoredEntity>>,
    next_serial: u64,
    calls: Vec<Call>,
    canned: Option<TestSuiteResult>,
    failing: Option<Operation>,
    published: Vec<(TestSuite, String)>,
}

/// See the module docs.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    state: Mutex<State>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing remote entity.
    pub fn with_entity(self, kind: EntityKind, id: &str, name: &str) -> Self {
        {
            let mut state = self.lock();
            let version_id = VersionId::from(format!("{id}-seed"));
            state.entities.entry(kind).or_default().push(StoredEntity {
                id: EntityId::from(id),
                name: name.to_string(),
                version_id,
                description: String::new(),
                code: String::new(),
                language: String::new(),
            });
        }
        self
    }

    /// Return `result` from every `test` call instead of echoing inputs.
    pub fn respond_with(self, result: TestSuiteResult) -> Self {
        self.lock().canned = Some(result);
        self
    }

    /// Make every call of `operation` fail with status 500.
    pub fn fail_on(self, operation: Operation) -> Self {
        self.lock().failing = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn entities(&self, kind: EntityKind) -> Vec<StoredEntity> {
        self.lock().entities.get(&kind).cloned().unwrap_or_default()
    }

    pub fn published(&self) -> Vec<(TestSuite, String)> {
        self.lock().published.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the recorded calls.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl State {
    fn check(&self, operation: Operation) -> Result<(), RemoteError> {
        if self.failing == Some(operation) {
            return Err(RemoteError::new(
                operation,
                Some(500),
                r#"{"message":"internal error"}"#,
            ));
        }
        Ok(())
    }

    fn next_version(&mut self, kind: EntityKind) -> VersionId {
        self.next_serial += 1;
        VersionId::from(format!("{kind}-v{}", self.next_serial))
    }
}

impl Workspace for MemoryWorkspace {
    fn list(&self, kind: EntityKind) -> Result<Vec<RemoteEntity>, RemoteError> {
        let mut state = self.lock();
        state.calls.push(Call::List(kind));
        state.check(Operation::List(kind))?;
        Ok(state
            .entities
            .get(&kind)
            .map(|all| {
                all.iter()
                    .map(|e| RemoteEntity {
                        id: Some(e.id.clone()),
                        name: Some(e.name.clone()),
                        version_id: Some(e.version_id.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create(
        &self,
        kind: EntityKind,
        draft: &EntityDraft<'_>,
    ) -> Result<WriteReceipt, RemoteError> {
        let mut state = self.lock();
        state.calls.push(Call::Create {
            kind,
            name: draft.name.to_string(),
        });
        state.check(Operation::Create(kind))?;
        let version_id = state.next_version(kind);
        let id = EntityId::from(format!("{kind}-{}", state.next_serial));
        state.entities.entry(kind).or_default().push(StoredEntity {
            id: id.clone(),
            name: draft.name.to_string(),
            version_id: version_id.clone(),
            description: draft.description.to_string(),
            code: draft.code.to_string(),
            language: draft.language.to_string(),
        });
        Ok(WriteReceipt { id, version_id })
    }

    fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        draft: &EntityDraft<'_>,
    ) -> Result<WriteReceipt, RemoteError> {
        let mut state = self.lock();
        state.calls.push(Call::Update {
            kind,
            id: id.clone(),
        });
        state.check(Operation::Update(kind))?;
        let version_id = state.next_version(kind);
        let entity = state
            .entities
            .get_mut(&kind)
            .and_then(|all| all.iter_mut().find(|e| &e.id == id))
            .ok_or_else(|| {
                RemoteError::new(Operation::Update(kind), Some(404), format!("no {kind} {id}"))
            })?;
        entity.version_id = version_id.clone();
        entity.description = draft.description.to_string();
        entity.code = draft.code.to_string();
        entity.language = draft.language.to_string();
        Ok(WriteReceipt {
            id: id.clone(),
            version_id,
        })
    }

    fn test(&self, suite: &TestSuite) -> Result<TestSuiteResult, RemoteError> {
        let mut state = self.lock();
        state.calls.push(Call::Test);
        state.check(Operation::Test)?;
        if let Some(canned) = &state.canned {
            return Ok(canned.clone());
        }
        let success_test_results = suite
            .transformations
            .iter()
            .map(|t| {
                let events = match &t.test_input {
                    Some(Value::Array(events)) => events.clone(),
                    Some(other) => vec![other.clone()],
                    None => Vec::new(),
                };
                TestResult {
                    transformer_version_id: Some(t.version_id.clone()),
                    result: Some(json!({ "output": { "transformedEvents": events } })),
                    ..TestResult::default()
                }
            })
            .collect();
        Ok(TestSuiteResult {
            success_test_results,
            failed_test_results: Vec::new(),
        })
    }

    fn publish(&self, suite: &TestSuite, commit_id: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.calls.push(Call::Publish {
            commit_id: commit_id.to_string(),
        });
        state.check(Operation::Publish)?;
        state.published.push((suite.clone(), commit_id.to_string()));
        Ok(())
    }
}
