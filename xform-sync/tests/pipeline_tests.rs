use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

use xform_core::{EntityKind, TestResult, TestSuiteResult, VersionId};
use xform_sync::memory::Call;
use xform_sync::{
    run, DirectoryArtifactStore, MemoryWorkspace, Operation, RunConfig, SyncError,
    TEST_RESULTS_ARTIFACT,
};

const EVENTS: &str = r#"[{"revenue": 15, "price": 20, "profit": 5, "city": "no data found"}]"#;

struct Fixture {
    dir: TempDir,
    transformations: Vec<Value>,
    libraries: Vec<Value>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
            transformations: Vec::new(),
            libraries: Vec::new(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    fn transformation(mut self, name: &str, input: Option<&str>, expected: Option<&str>) -> Self {
        let code = self.write(
            &format!("{name}.js"),
            "export function transformEvent(event) { return event; }",
        );
        let mut def = json!({"name": name, "file": code, "language": "javascript"});
        if let Some(input) = input {
            def["test-input-file"] = json!(self.write(&format!("{name}_input.json"), input));
        }
        if let Some(expected) = expected {
            def["expected-output"] = json!(self.write(&format!("{name}_expected.json"), expected));
        }
        self.transformations.push(def);
        self
    }

    fn library(mut self, name: &str) -> Self {
        let code = self.write(&format!("{name}.js"), "export function helper() { return 1; }");
        self.libraries
            .push(json!({"name": name, "file": code, "language": "javascript"}));
        self
    }

    fn config(&self) -> RunConfig {
        let meta = json!({
            "transformations": self.transformations,
            "libraries": self.libraries,
        });
        let meta_path = self.write("meta.json", &meta.to_string());
        RunConfig {
            meta_path,
            output_dir: self.path().join("test-outputs"),
            ..RunConfig::default()
        }
    }
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json")
}

#[test]
fn fresh_workspace_creates_everything_and_tests_once() {
    let fx = Fixture::new()
        .transformation("First", Some(EVENTS), None)
        .transformation("Second", None, None)
        .library("getFinanceData");
    let ws = MemoryWorkspace::new();

    let summary = run(&fx.config(), &ws, None).expect("run");

    assert_eq!(summary.transformations, 2);
    assert_eq!(summary.libraries, 1);
    assert!(!summary.published);

    let calls = ws.calls();
    let creates = calls
        .iter()
        .filter(|c| matches!(c, Call::Create { .. }))
        .count();
    assert_eq!(creates, 3);
    assert_eq!(calls.iter().filter(|c| **c == Call::Test).count(), 1);
    assert!(!calls.iter().any(|c| matches!(c, Call::Publish { .. })));

    // Transformations are upserted before libraries, in meta order.
    let names: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Create { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["First", "Second", "getFinanceData"]);

    assert_eq!(summary.suite.transformations.len(), 2);
    assert!(summary.suite.transformations[0].test_input.is_some());
    assert!(summary.suite.transformations[1].test_input.is_none());
    assert_eq!(summary.suite.libraries.len(), 1);
}

#[test]
fn second_run_updates_instead_of_creating() {
    let fx = Fixture::new()
        .transformation("T1", Some(EVENTS), None)
        .library("lib");
    let config = fx.config();
    let ws = MemoryWorkspace::new();

    run(&config, &ws, None).expect("first run");
    let first_versions: Vec<_> = ws
        .entities(EntityKind::Transformation)
        .into_iter()
        .map(|e| e.version_id)
        .collect();
    run(&config, &ws, None).expect("second run");

    let calls = ws.calls();
    let updates = calls
        .iter()
        .filter(|c| matches!(c, Call::Update { .. }))
        .count();
    assert_eq!(updates, 2);
    assert_eq!(ws.entities(EntityKind::Transformation).len(), 1);
    assert_eq!(ws.entities(EntityKind::Library).len(), 1);
    assert_ne!(
        ws.entities(EntityKind::Transformation)[0].version_id,
        first_versions[0]
    );
}

#[test]
fn matching_output_is_written_and_published() {
    let fx = Fixture::new().transformation("T1", Some(EVENTS), Some(EVENTS));
    let config = RunConfig {
        test_only: false,
        commit_id: "8f2c1a".to_string(),
        ..fx.config()
    };
    let ws = MemoryWorkspace::new();

    let summary = run(&config, &ws, None).expect("run");

    let output = fx.path().join("test-outputs").join("t1_output.json");
    assert_eq!(read(&output), serde_json::from_str::<Value>(EVENTS).unwrap());
    assert!(!fx.path().join("test-outputs").join("t1_diff.json").exists());
    assert!(summary.published);
    assert_eq!(summary.comparisons.len(), 1);
    assert!(summary.comparisons[0].expected_checked);

    let published = ws.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1, "8f2c1a");
    assert_eq!(published[0].0, summary.suite);
}

#[test]
fn failed_tests_stop_before_any_output_is_written() {
    let fx = Fixture::new().transformation("T1", Some(EVENTS), Some(EVENTS));
    let failed = TestResult {
        transformer_version_id: Some(VersionId::from("transformation-v1")),
        name: Some("T1".to_string()),
        result: Some(json!("TypeError: event.properties is undefined")),
        ..TestResult::default()
    };
    let ws = MemoryWorkspace::new().respond_with(TestSuiteResult {
        success_test_results: Vec::new(),
        failed_test_results: vec![failed],
    });
    let config = RunConfig {
        test_only: false,
        ..fx.config()
    };

    let err = run(&config, &ws, None).unwrap_err();

    match err {
        SyncError::TestFailure { failed } => assert_eq!(failed.len(), 1),
        other => panic!("expected TestFailure, got {other}"),
    }
    assert!(!fx.path().join("test-outputs").exists());
    assert!(ws.published().is_empty());
}

#[test]
fn mismatch_is_uploaded_then_fails_without_publishing() {
    let fx = Fixture::new().transformation(
        "T1",
        Some(r#"[{"city": "Kolkatas"}]"#),
        Some(r#"[{"city": "Kolkata"}]"#),
    );
    let artifacts = TempDir::new().expect("artifacts");
    let store = DirectoryArtifactStore::new(artifacts.path());
    let config = RunConfig {
        test_only: false,
        upload_artifact: true,
        ..fx.config()
    };
    let ws = MemoryWorkspace::new();

    let err = run(&config, &ws, Some(&store)).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Test output does not match for transformation: T1"
    );
    let diff = read(&fx.path().join("test-outputs").join("t1_diff.json"));
    assert_eq!(
        diff,
        json!({"added": {}, "deleted": {}, "updated": {"0": {"city": "Kolkatas"}}})
    );

    let staged = artifacts.path().join(TEST_RESULTS_ARTIFACT).join("test-outputs");
    assert!(staged.join("t1_output.json").exists());
    assert!(staged.join("t1_diff.json").exists());
    assert!(ws.published().is_empty());
}

#[test]
fn results_for_versions_outside_the_run_are_ignored() {
    let fx = Fixture::new().transformation("T1", None, None);
    let stray = TestResult {
        transformer_version_id: Some(VersionId::from("someone-elses-version")),
        result: Some(json!({"output": {"transformedEvents": [{"x": 1}]}})),
        ..TestResult::default()
    };
    let ws = MemoryWorkspace::new().respond_with(TestSuiteResult {
        success_test_results: vec![stray],
        failed_test_results: Vec::new(),
    });

    let summary = run(&fx.config(), &ws, None).expect("run");

    assert!(summary.comparisons.is_empty());
    assert!(summary.output_files.is_empty());
    let outputs = fx.path().join("test-outputs");
    assert_eq!(fs::read_dir(outputs).expect("output dir").count(), 0);
}

#[test]
fn existing_remote_entity_is_updated_by_name() {
    let fx = Fixture::new().transformation("T1", None, None);
    let ws = MemoryWorkspace::new().with_entity(EntityKind::Transformation, "2Y7OF", "T1");

    run(&fx.config(), &ws, None).expect("run");

    assert!(ws.calls().contains(&Call::Update {
        kind: EntityKind::Transformation,
        id: "2Y7OF".into(),
    }));
    assert!(!ws
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Create { .. })));
}

#[test]
fn remote_write_failure_aborts_before_testing() {
    let fx = Fixture::new()
        .transformation("T1", None, None)
        .transformation("T2", None, None);
    let ws = MemoryWorkspace::new().fail_on(Operation::Create(EntityKind::Transformation));

    let err = run(&fx.config(), &ws, None).unwrap_err();

    match err {
        SyncError::Remote(remote) => assert_eq!(remote.status, Some(500)),
        other => panic!("expected Remote, got {other}"),
    }
    let calls = ws.calls();
    assert_eq!(
        calls
            .iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .count(),
        1
    );
    assert!(!calls.contains(&Call::Test));
}

#[test]
fn duplicate_remote_names_fail_fast() {
    let fx = Fixture::new().transformation("T1", None, None);
    let ws = MemoryWorkspace::new()
        .with_entity(EntityKind::Library, "a", "shared")
        .with_entity(EntityKind::Library, "b", "shared");

    let err = run(&fx.config(), &ws, None).unwrap_err();

    assert!(matches!(err, SyncError::DuplicateRemoteName { .. }));
    assert!(!ws
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Create { .. } | Call::Update { .. })));
}

#[test]
fn empty_fixture_paths_use_default_payload_and_skip_comparison() {
    let fx = Fixture::new();
    let code = fx.write("t1.js", "export function transformEvent(e) { return e; }");
    let meta = json!({
        "transformations": [{
            "name": "T1", "file": code, "language": "javascript",
            "test-input-file": "", "expected-output": "",
        }],
    });
    let config = RunConfig {
        meta_path: fx.write("meta.json", &meta.to_string()),
        output_dir: fx.path().join("test-outputs"),
        ..RunConfig::default()
    };

    let summary = run(&config, &MemoryWorkspace::new(), None).expect("run");

    assert!(summary.suite.transformations[0].test_input.is_none());
    assert_eq!(summary.comparisons.len(), 1);
    assert!(!summary.comparisons[0].expected_checked);
    assert!(fx.path().join("test-outputs").join("t1_output.json").exists());
}
