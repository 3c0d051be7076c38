//! Test suite assembly.

use std::path::Path;

use serde_json::Value;

use xform_core::{LibraryTest, TestSuite, TransformationTest, VersionMap};

use crate::error::{io_err, json_err, SyncError};

/// Pair each transformation version with its parsed test input, and list
/// each library version by id.
///
/// A transformation without a `test-input-file` is sent with its version id
/// only, which makes the remote side test it against its default payload.
pub fn build(
    transformations: &VersionMap,
    libraries: &VersionMap,
) -> Result<TestSuite, SyncError> {
    tracing::info!("building test suite");

    let mut suite = TestSuite::default();
    for (version_id, entity) in transformations {
        let test_input = match &entity.definition.test_input_file {
            Some(path) => Some(read_json(path)?),
            None => {
                tracing::info!(
                    "no test input provided; testing {} with default payload",
                    entity.definition.name
                );
                None
            }
        };
        suite.transformations.push(TransformationTest {
            version_id: version_id.clone(),
            test_input,
        });
    }
    suite.libraries = libraries
        .keys()
        .map(|version_id| LibraryTest {
            version_id: version_id.clone(),
        })
        .collect();

    tracing::info!(
        "transformation versions to test: {}",
        serde_json::to_string(&suite.transformations)?
    );
    tracing::info!(
        "library versions to test: {}",
        serde_json::to_string(&suite.libraries)?
    );
    Ok(suite)
}

/// Read and parse a JSON fixture.
pub(crate) fn read_json(path: &Path) -> Result<Value, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|e| json_err(path, e))
}
