//! `xform diff <expected> <actual>` — print the detailed diff of two JSON files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use xform_sync::{detailed_diff, json_eq};

/// Arguments for `xform diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Expected JSON, e.g. an expected-output fixture.
    pub expected: PathBuf,

    /// Actual JSON, e.g. a `<name>_output.json`.
    pub actual: PathBuf,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let expected = read(&self.expected)?;
        let actual = read(&self.actual)?;

        if json_eq(&expected, &actual) {
            println!("No differences.");
            return Ok(());
        }

        let diff = detailed_diff(&expected, &actual);
        println!(
            "{}",
            serde_json::to_string_pretty(&diff).context("failed to serialize diff")?
        );
        Ok(())
    }
}

fn read(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}
