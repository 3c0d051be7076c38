//! Run the assembled suite against the remote test endpoint.

use xform_core::{TestSuite, TestSuiteResult};

use crate::workspace::Workspace;
use crate::SyncError;

/// Send `suite` in a single call and fail if any test failed.
///
/// On success the returned result has an empty `failed_test_results`.
pub fn run(workspace: &dyn Workspace, suite: &TestSuite) -> Result<TestSuiteResult, SyncError> {
    tracing::info!("running test suite for transformations and libraries");
    let result = workspace.test(suite)?;

    tracing::info!(
        "total tests {}, {} passed and {} failed",
        result.total(),
        result.success_test_results.len(),
        result.failed_test_results.len()
    );
    for failed in &result.failed_test_results {
        tracing::error!(
            "test failed: id={} name={} error={}",
            failed.id.as_ref().map(|id| id.0.as_str()).unwrap_or("-"),
            failed.name.as_deref().unwrap_or("-"),
            failed
                .result
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default()
        );
    }

    if !result.failed_test_results.is_empty() {
        return Err(SyncError::TestFailure {
            failed: result.failed_test_results,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use xform_core::{EntityId, TestResult, VersionId};

    use super::*;
    use crate::memory::{Call, MemoryWorkspace};

    #[test]
    fn failed_results_become_test_failure() {
        let failed = TestResult {
            id: Some(EntityId::from("2Y7OF")),
            name: Some("T1".to_string()),
            result: Some(json!("ReferenceError: x is not defined")),
            ..TestResult::default()
        };
        let ws = MemoryWorkspace::new().respond_with(TestSuiteResult {
            success_test_results: vec![],
            failed_test_results: vec![failed.clone()],
        });

        let err = run(&ws, &TestSuite::default()).unwrap_err();
        match err {
            SyncError::TestFailure { failed: got } => assert_eq!(got, vec![failed]),
            other => panic!("expected TestFailure, got {other}"),
        }
        assert!(SyncError::TestFailure { failed: vec![] }
            .to_string()
            .starts_with("Failures occurred while running tests"));
    }

    #[test]
    fn all_passing_returns_results() {
        let ok = TestResult {
            transformer_version_id: Some(VersionId::from("tv1")),
            result: Some(json!({"output": {"transformedEvents": []}})),
            ..TestResult::default()
        };
        let ws = MemoryWorkspace::new().respond_with(TestSuiteResult {
            success_test_results: vec![ok],
            failed_test_results: vec![],
        });

        let result = run(&ws, &TestSuite::default()).expect("run");
        assert_eq!(result.success_test_results.len(), 1);
        assert_eq!(ws.calls(), vec![Call::Test]);
    }
}
