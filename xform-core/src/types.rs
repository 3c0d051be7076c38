//! Domain types shared by the loader, the sync pipeline and the CLI.
//!
//! All path fields use `PathBuf`. Wire-facing structs carry the exact JSON key
//! names the meta file and the remote workspace API use.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable remote identifier of a transformation or library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque version identifier returned by every create/update call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub String);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VersionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which remote collection an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Transformation,
    Library,
}

impl EntityKind {
    pub fn all() -> &'static [EntityKind] {
        &[EntityKind::Transformation, EntityKind::Library]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Transformation => "transformation",
            EntityKind::Library => "library",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Local definitions (meta file)
// ---------------------------------------------------------------------------

/// A transformation or library as declared in the meta file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Source file holding the code to upload.
    pub file: PathBuf,
    pub language: String,
    /// JSON file with the events to test against. `""` counts as absent.
    #[serde(
        rename = "test-input-file",
        default,
        deserialize_with = "non_empty_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub test_input_file: Option<PathBuf>,
    /// JSON fixture the transformed events must match. `""` counts as absent.
    #[serde(
        rename = "expected-output",
        default,
        deserialize_with = "non_empty_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_output_file: Option<PathBuf>,
}

fn non_empty_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let path = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(path.filter(|p| !p.as_os_str().is_empty()))
}

/// Root of the meta file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Meta {
    #[serde(default)]
    pub transformations: Vec<EntityDefinition>,
    #[serde(default)]
    pub libraries: Vec<EntityDefinition>,
}

impl Meta {
    pub fn definitions(&self, kind: EntityKind) -> &[EntityDefinition] {
        match kind {
            EntityKind::Transformation => &self.transformations,
            EntityKind::Library => &self.libraries,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote workspace shapes
// ---------------------------------------------------------------------------

/// An entity as listed by the remote workspace. Only `id` and `name` matter
/// here; everything else the API returns is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RemoteEntity {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "versionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<VersionId>,
}

/// Identifiers returned by a create or update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub id: EntityId,
    #[serde(rename = "versionId")]
    pub version_id: VersionId,
}

/// A local definition after it has been written remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedEntity {
    pub definition: EntityDefinition,
    pub id: EntityId,
}

/// Version id → entity, in the order the entities were upserted.
pub type VersionMap = IndexMap<VersionId, VersionedEntity>;

// ---------------------------------------------------------------------------
// Test suite request / response
// ---------------------------------------------------------------------------

/// One transformation version to test. Without `testInput` the remote side
/// falls back to its default payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationTest {
    #[serde(rename = "versionId")]
    pub version_id: VersionId,
    #[serde(rename = "testInput", default, skip_serializing_if = "Option::is_none")]
    pub test_input: Option<Value>,
}

/// One library version to test; exercised through the transformations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryTest {
    #[serde(rename = "versionId")]
    pub version_id: VersionId,
}

/// The request body for both the test and the publish endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TestSuite {
    pub transformations: Vec<TransformationTest>,
    pub libraries: Vec<LibraryTest>,
}

/// A single entry of `successTestResults` / `failedTestResults`.
///
/// `result` is kept as raw JSON: successes carry
/// `{"output": {"transformedEvents": [...]}}`, failures carry whatever error
/// payload the test engine produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TestResult {
    #[serde(
        rename = "transformerVersionID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transformer_version_id: Option<VersionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl TestResult {
    /// `result.output.transformedEvents`, if the payload has that shape.
    pub fn transformed_events(&self) -> Option<&Vec<Value>> {
        self.result
            .as_ref()?
            .get("output")?
            .get("transformedEvents")?
            .as_array()
    }
}

/// Results partitioned by the remote test engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TestSuiteResult {
    #[serde(rename = "successTestResults", default)]
    pub success_test_results: Vec<TestResult>,
    #[serde(rename = "failedTestResults", default)]
    pub failed_test_results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn total(&self) -> usize {
        self.success_test_results.len() + self.failed_test_results.len()
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// What the comparator did for one transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonOutcome {
    pub name: String,
    pub output_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_file: Option<PathBuf>,
    /// `false` when no expected-output fixture was declared.
    pub expected_checked: bool,
    pub mismatch: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn newtype_display() {
        assert_eq!(EntityId::from("2Y7OF").to_string(), "2Y7OF");
        assert_eq!(VersionId::from(String::from("v-1")).to_string(), "v-1");
    }

    #[test]
    fn entity_kind_display() {
        assert_eq!(EntityKind::Transformation.to_string(), "transformation");
        assert_eq!(EntityKind::Library.to_string(), "library");
    }

    #[test]
    fn definition_uses_hyphenated_fixture_keys() {
        let def: EntityDefinition = serde_json::from_value(json!({
            "file": "./code/code.js",
            "name": "Transformation1",
            "description": "Description 1",
            "language": "javascript",
            "test-input-file": "./code/events.json",
            "expected-output": "./code/expected.json",
        }))
        .expect("deserialize");
        assert_eq!(def.test_input_file, Some(PathBuf::from("./code/events.json")));
        assert_eq!(
            def.expected_output_file,
            Some(PathBuf::from("./code/expected.json"))
        );
    }

    #[test]
    fn definition_description_defaults_to_empty() {
        let def: EntityDefinition = serde_json::from_value(json!({
            "file": "./code/lib1.js",
            "name": "getFinanceData",
            "language": "javascript",
        }))
        .expect("deserialize");
        assert_eq!(def.description, "");
        assert!(def.test_input_file.is_none());
    }

    #[test]
    fn empty_fixture_paths_are_absent() {
        let def: EntityDefinition = serde_json::from_value(json!({
            "file": "./code/code.js",
            "name": "Transformation1",
            "language": "javascript",
            "test-input-file": "",
            "expected-output": "",
        }))
        .expect("deserialize");
        assert!(def.test_input_file.is_none());
        assert!(def.expected_output_file.is_none());

        let null: EntityDefinition = serde_json::from_value(json!({
            "file": "./code/code.js",
            "name": "Transformation1",
            "language": "javascript",
            "expected-output": null,
        }))
        .expect("deserialize");
        assert!(null.expected_output_file.is_none());
    }

    #[test]
    fn transformation_test_without_input_serializes_version_only() {
        let t = TransformationTest {
            version_id: VersionId::from("v1"),
            test_input: None,
        };
        assert_eq!(serde_json::to_value(&t).unwrap(), json!({"versionId": "v1"}));
    }

    #[test]
    fn remote_entity_ignores_unknown_fields() {
        let e: RemoteEntity = serde_json::from_value(json!({
            "id": "2Y7OF8oTCk3EzvNdEhH4pZG1SUx",
            "versionId": "2Y7OaZu6BQev1e51DpIHxCWmEV2",
            "name": "Transformation2",
            "codeVersion": "1",
            "destinations": [],
        }))
        .expect("deserialize");
        assert_eq!(e.name.as_deref(), Some("Transformation2"));
        assert_eq!(e.id, Some(EntityId::from("2Y7OF8oTCk3EzvNdEhH4pZG1SUx")));
    }

    #[test]
    fn test_result_reads_transformer_version_id() {
        let r: TestResult = serde_json::from_value(json!({
            "transformerVersionID": "v9",
            "result": {"output": {"transformedEvents": [{"a": 1}]}},
        }))
        .expect("deserialize");
        assert_eq!(r.transformer_version_id, Some(VersionId::from("v9")));
        assert_eq!(r.transformed_events(), Some(&vec![json!({"a": 1})]));
    }

    #[test]
    fn failed_result_keeps_raw_error_payload() {
        let r: TestResult = serde_json::from_value(json!({
            "id": "2Y7OF",
            "name": "Transformation1",
            "result": "ReferenceError: foo is not defined",
        }))
        .expect("deserialize");
        assert_eq!(r.id, Some(EntityId::from("2Y7OF")));
        assert!(r.transformed_events().is_none());
        assert_eq!(r.result, Some(json!("ReferenceError: foo is not defined")));
    }

    #[test]
    fn failed_result_without_id_deserializes() {
        let r: TestResult = serde_json::from_value(json!({
            "transformerVersionID": "v7",
            "result": "timeout",
        }))
        .expect("deserialize");
        assert!(r.id.is_none());
        assert_eq!(r.transformer_version_id, Some(VersionId::from("v7")));
    }
}
