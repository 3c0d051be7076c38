//! Name → remote id lookup used to choose between create and update.

use std::collections::HashMap;

use xform_core::{EntityId, EntityKind, RemoteEntity};

use crate::SyncError;

/// Remote ids of one entity kind, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIndex {
    kind: EntityKind,
    ids: HashMap<String, EntityId>,
}

impl NameIndex {
    /// Build the index from a fresh listing.
    ///
    /// Fails on an entity without `name` or `id`, and on two entities sharing
    /// a name, since either would make create-vs-update ambiguous.
    pub fn build(kind: EntityKind, entities: &[RemoteEntity]) -> Result<Self, SyncError> {
        let mut ids = HashMap::with_capacity(entities.len());
        for (index, entity) in entities.iter().enumerate() {
            let name = entity
                .name
                .as_ref()
                .ok_or(SyncError::MissingRemoteField { kind, index, field: "name" })?;
            let id = entity
                .id
                .as_ref()
                .ok_or(SyncError::MissingRemoteField { kind, index, field: "id" })?;
            if ids.insert(name.clone(), id.clone()).is_some() {
                return Err(SyncError::DuplicateRemoteName {
                    kind,
                    name: name.clone(),
                });
            }
        }
        tracing::debug!("indexed {} remote {kind} name(s)", ids.len());
        Ok(Self { kind, ids })
    }

    pub fn get(&self, name: &str) -> Option<&EntityId> {
        self.ids.get(name)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }
}
