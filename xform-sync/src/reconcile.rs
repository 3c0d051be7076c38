//! Create-or-update each local definition in the remote workspace.

use xform_core::{EntityDefinition, VersionMap, VersionedEntity};

use crate::error::{io_err, SyncError};
use crate::index::NameIndex;
use crate::workspace::{EntityDraft, Workspace};

/// Upsert every definition of `index.kind()`, one remote call each.
///
/// A name found in `index` is updated under its existing id, anything else is
/// created. The returned map is keyed by the version id each call handed back
/// and keeps `definitions` order. The first failure (unreadable source file,
/// remote error) aborts the whole upsert.
pub fn upsert(
    workspace: &dyn Workspace,
    index: &NameIndex,
    definitions: &[EntityDefinition],
) -> Result<VersionMap, SyncError> {
    let kind = index.kind();
    tracing::info!("upserting {} {kind}(s)", definitions.len());

    let mut versions = VersionMap::with_capacity(definitions.len());
    for def in definitions {
        let code = std::fs::read_to_string(&def.file).map_err(|e| io_err(&def.file, e))?;
        let draft = EntityDraft {
            name: &def.name,
            description: &def.description,
            code: &code,
            language: &def.language,
        };

        let receipt = match index.get(&def.name) {
            Some(id) => {
                tracing::info!("updating {kind}: {}", def.name);
                workspace.update(kind, id, &draft)?
            }
            None => {
                tracing::info!("creating {kind}: {}", def.name);
                workspace.create(kind, &draft)?
            }
        };
        tracing::debug!("{kind} '{}' -> version {}", def.name, receipt.version_id);

        if let Some(existing) = versions.get(&receipt.version_id) {
            return Err(SyncError::DuplicateVersion {
                kind,
                name: def.name.clone(),
                existing: existing.definition.name.clone(),
                version_id: receipt.version_id,
            });
        }
        versions.insert(
            receipt.version_id,
            VersionedEntity {
                definition: def.clone(),
                id: receipt.id,
            },
        );
    }
    Ok(versions)
}
