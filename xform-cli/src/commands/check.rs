//! `xform check` — validate a meta file and the files it references offline.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use xform_core::{meta, EntityKind, Meta};

/// Arguments for `xform check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Meta file listing transformations and libraries.
    #[arg(long, env = "INPUT_METAPATH")]
    pub meta_path: PathBuf,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let meta = meta::load(&self.meta_path)
            .with_context(|| format!("failed to load {}", self.meta_path.display()))?;

        let problems = problems(&meta);
        if problems.is_empty() {
            println!(
                "{} {}: {} transformation(s), {} librar{}",
                "✓".green().bold(),
                self.meta_path.display(),
                meta.transformations.len(),
                meta.libraries.len(),
                if meta.libraries.len() == 1 { "y" } else { "ies" },
            );
            return Ok(());
        }

        for problem in &problems {
            println!("{} {problem}", "✗".red().bold());
        }
        bail!("{} problem(s) found in {}", problems.len(), self.meta_path.display())
    }
}

/// Every unreadable code file and every missing or unparsable JSON fixture.
fn problems(meta: &Meta) -> Vec<String> {
    let mut found = Vec::new();
    for &kind in EntityKind::all() {
        for def in meta.definitions(kind) {
            let label = format!("{kind} '{}'", def.name);
            if let Err(e) = std::fs::read_to_string(&def.file) {
                found.push(format!("{label}: code file {}: {e}", def.file.display()));
            }
            for (what, path) in [
                ("test input", def.test_input_file.as_deref()),
                ("expected output", def.expected_output_file.as_deref()),
            ] {
                if let Some(path) = path {
                    if let Err(reason) = check_json(path) {
                        found.push(format!("{label}: {what} {}: {reason}", path.display()));
                    }
                }
            }
        }
    }
    found
}

fn check_json(path: &Path) -> std::result::Result<(), String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str::<serde_json::Value>(&contents)
        .map(|_| ())
        .map_err(|e| format!("invalid JSON: {e}"))
}
