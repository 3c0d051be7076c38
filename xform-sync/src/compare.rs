//! Persist actual test output and check it against expected fixtures.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use xform_core::{ComparisonOutcome, TestResult, VersionMap};

use crate::diff::{detailed_diff, json_eq};
use crate::error::{io_err, SyncError};
use crate::suite::read_json;
use crate::writer::write_json;

/// Everything the comparator produced for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub outcomes: Vec<ComparisonOutcome>,
    /// One message per mismatching transformation.
    pub mismatches: Vec<String>,
    /// Output and diff files in the order they were written.
    pub output_files: Vec<PathBuf>,
}

/// File-name-safe camel-case handle for a transformation name.
///
/// Words are split on anything non-alphanumeric, on lower→upper case changes,
/// before the last capital of an acronym and between letters and digits.
/// `"My transformation-2"` → `"myTransformation2"`, `"T1"` → `"t1"`.
///
/// A digit run is its own word, so a following letter starts a capitalised
/// word: `"2nd"` → `"2Nd"`. A name with no alphanumeric characters maps to
/// `"transformation"` so output files never start with a bare `_`.
pub fn handle(name: &str) -> String {
    let mut words = Vec::new();
    for chunk in name.split(|c: char| !c.is_alphanumeric()) {
        split_words(chunk, &mut words);
    }

    let mut out = String::with_capacity(name.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        out.push_str("transformation");
    }
    out
}

fn split_words(chunk: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = chunk.chars().collect();
    let mut start = 0;
    for i in 1..chars.len() {
        let (prev, cur) = (chars[i - 1], chars[i]);
        let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
        let boundary = (prev.is_lowercase() && cur.is_uppercase())
            || (prev.is_uppercase() && cur.is_uppercase() && next_is_lower)
            || (prev.is_alphabetic() && cur.is_numeric())
            || (prev.is_numeric() && cur.is_alphabetic());
        if boundary {
            out.push(chars[start..i].iter().collect());
            start = i;
        }
    }
    if start < chars.len() {
        out.push(chars[start..].iter().collect());
    }
}

/// Write `<handle>_output.json` for every successful result of a known
/// transformation and diff it against the declared expected output.
///
/// Results whose `transformerVersionID` is not in `transformations` are
/// skipped. Mismatches are collected, never raised here, so that every diff
/// gets written.
pub fn compare(
    results: &[TestResult],
    transformations: &VersionMap,
    output_dir: &Path,
) -> Result<Comparison, SyncError> {
    tracing::info!("comparing actual output with expected output");
    std::fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;

    let mut comparison = Comparison::default();
    let mut handles = HashSet::new();

    for result in results {
        let Some(version_id) = result.transformer_version_id.as_ref() else {
            continue;
        };
        let Some(entity) = transformations.get(version_id) else {
            tracing::debug!("skipping result for unknown version {version_id}");
            continue;
        };
        let name = &entity.definition.name;
        let actual = result
            .transformed_events()
            .ok_or_else(|| SyncError::MissingOutput {
                version_id: version_id.clone(),
            })?;

        let handle = handle(name);
        if !handles.insert(handle.clone()) {
            tracing::warn!("'{name}' shares output handle '{handle}' with another transformation");
        }

        let output_file = output_dir.join(format!("{handle}_output.json"));
        write_json(&output_file, actual)?;
        comparison.output_files.push(output_file.clone());

        let mut outcome = ComparisonOutcome {
            name: name.clone(),
            output_file,
            diff_file: None,
            expected_checked: false,
            mismatch: false,
        };

        if let Some(expected_path) = &entity.definition.expected_output_file {
            let expected = read_json(expected_path)?;
            let actual = Value::Array(actual.clone());
            outcome.expected_checked = true;

            if !json_eq(&expected, &actual) {
                let message = format!("Test output does not match for transformation: {name}");
                tracing::warn!("{message}");
                comparison.mismatches.push(message);

                let diff_file = output_dir.join(format!("{handle}_diff.json"));
                write_json(&diff_file, &detailed_diff(&expected, &actual))?;
                comparison.output_files.push(diff_file.clone());
                outcome.diff_file = Some(diff_file);
                outcome.mismatch = true;
            }
        }

        comparison.outcomes.push(outcome);
    }

    Ok(comparison)
}
