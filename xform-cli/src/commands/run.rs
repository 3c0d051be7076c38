//! `xform run` — upsert, test, compare and optionally publish.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use xform_core::TestResult;
use xform_sync::{pipeline, DirectoryArtifactStore, RunConfig, RunSummary, SyncError};

use crate::client::{HttpConfig, HttpWorkspace, DEFAULT_ENDPOINT};

/// Arguments for `xform run`. Each one can also come from the environment
/// variable the CI workflow sets for it.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Meta file listing transformations and libraries.
    #[arg(long, env = "INPUT_METAPATH")]
    pub meta_path: PathBuf,

    /// Account email used for basic auth.
    #[arg(long, env = "INPUT_EMAIL")]
    pub email: String,

    /// Access token used for basic auth.
    #[arg(long, env = "INPUT_ACCESSTOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Base URL of the transformations API.
    #[arg(long, env = "INPUT_SERVERENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub server_endpoint: String,

    /// Stage output and diff files as a test artifact.
    #[arg(
        long,
        env = "INPUT_UPLOADTESTARTIFACT",
        default_value = "false",
        value_parser = parse_boolish,
        action = ArgAction::Set
    )]
    pub upload_test_artifact: bool,

    /// Only test; publish when set to false.
    #[arg(
        long,
        env = "TEST_ONLY",
        default_value = "true",
        value_parser = parse_boolish,
        action = ArgAction::Set
    )]
    pub test_only: bool,

    /// Commit the published versions are tagged with.
    #[arg(long, env = "GITHUB_SHA", default_value = "")]
    pub commit_id: String,

    /// Directory for `<name>_output.json` and `<name>_diff.json`.
    #[arg(long, default_value = "./test-outputs")]
    pub output_dir: PathBuf,

    /// Directory test artifacts are staged in.
    #[arg(long, env = "XFORM_ARTIFACT_DIR", default_value = "./artifacts")]
    pub artifact_dir: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let workspace = HttpWorkspace::new(&HttpConfig {
            endpoint: self.server_endpoint.clone(),
            email: self.email.clone(),
            access_token: self.access_token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        })?;
        let store = DirectoryArtifactStore::new(&self.artifact_dir);
        let config = self.config();

        match pipeline::run(&config, &workspace, Some(&store)) {
            Ok(summary) => {
                print_summary(&summary);
                Ok(())
            }
            Err(err) => {
                print_failure(&err);
                Err(err).context("transformation test run failed")
            }
        }
    }

    fn config(&self) -> RunConfig {
        RunConfig {
            meta_path: self.meta_path.clone(),
            output_dir: self.output_dir.clone(),
            test_only: self.test_only,
            upload_artifact: self.upload_test_artifact,
            commit_id: self.commit_id.clone(),
        }
    }
}

/// Accepts the spellings CI inputs use for booleans.
pub fn parse_boolish(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("expected true or false, got '{other}'")),
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "transformation")]
    name: String,
    #[tabled(rename = "output")]
    output: String,
    #[tabled(rename = "expected output")]
    result: String,
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} {} transformation(s), {} librar{} | {} test(s) passed",
        "✓".green().bold(),
        summary.transformations,
        summary.libraries,
        if summary.libraries == 1 { "y" } else { "ies" },
        summary.tests_passed,
    );

    if !summary.comparisons.is_empty() {
        let rows: Vec<OutcomeRow> = summary
            .comparisons
            .iter()
            .map(|outcome| OutcomeRow {
                name: outcome.name.clone(),
                output: outcome.output_file.display().to_string(),
                result: if !outcome.expected_checked {
                    "not declared".to_string()
                } else if outcome.mismatch {
                    "MISMATCH".to_string()
                } else {
                    "MATCH".to_string()
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    if let Some(artifact) = &summary.artifact {
        println!(
            "Artifact {} staged at {} ({} file(s))",
            artifact.id,
            artifact.location.display(),
            artifact.files
        );
    }

    if summary.published {
        println!("{} published", "✓".green().bold());
    } else {
        println!("Test-only run; nothing published.");
    }
}

fn print_failure(err: &SyncError) {
    match err {
        SyncError::TestFailure { failed } => {
            eprintln!(
                "{}",
                format!("{} test(s) failed:", failed.len()).red().bold()
            );
            for result in failed {
                eprintln!("{}", describe_failure(result).red());
            }
        }
        SyncError::OutputMismatch { messages } => {
            for message in messages {
                eprintln!("{} {message}", "✗".red().bold());
            }
        }
        _ => {}
    }
}

fn describe_failure(result: &TestResult) -> String {
    let id = result
        .id
        .as_ref()
        .map(|id| id.0.as_str())
        .or(result.transformer_version_id.as_ref().map(|v| v.0.as_str()))
        .unwrap_or("?");
    let name = result.name.as_deref().unwrap_or("unnamed");
    let detail = match &result.result {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => "no error detail".to_string(),
    };
    format!("  {name} ({id}): {detail}")
}
