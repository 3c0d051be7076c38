//! xform — test and publish transformations and libraries from CI.
//!
//! # Usage
//!
//! ```text
//! xform run --meta-path <file> --email <email> --access-token <token>
//!           [--server-endpoint <url>] [--test-only true|false]
//!           [--upload-test-artifact true|false] [--commit-id <sha>]
//!           [--output-dir <dir>] [--artifact-dir <dir>] [--timeout-secs <n>]
//! xform check --meta-path <file>
//! xform diff <expected.json> <actual.json>
//! ```
//!
//! `run` options also read the environment variables a GitHub workflow sets
//! (`INPUT_METAPATH`, `INPUT_EMAIL`, `TEST_ONLY`, `GITHUB_SHA`, ...).

mod client;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{check::CheckArgs, diff::DiffArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "xform",
    version,
    about = "Test and publish transformations and libraries",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upsert, test and compare every entry of a meta file, then publish.
    Run(RunArgs),

    /// Validate a meta file and the files it references without network access.
    Check(CheckArgs),

    /// Show the added/deleted/updated diff between two JSON files.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<()> = match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Diff(args) => args.run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
                println!("::error::{}", escape_workflow_data(&format!("{err:#}")));
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Escape a message for a GitHub workflow command.
fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
