//! Shared CLI runner so that `metapack` and the single-purpose `clean-meta` /
//! `compress-meta` binaries go through the same dispatch and reporting.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use crate::archive::{self, ArchiveReport};
use crate::clean::{self, CleanReport};
use crate::cli::{self, CleanArgs, Cli, Commands, CommonArgs, CompressArgs};
use crate::config::Config;
use crate::logging::{self, LogConfig};
use crate::restore::{self, RestoreReport};
use crate::MetaError;

/// Report of whichever command ran, tagged for `--json` output.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Outcome {
    Clean(CleanReport),
    Compress(ArchiveReport),
    Restore(RestoreReport),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    /// Files the command could not handle, with the reason.
    pub fn failures(&self) -> &[(PathBuf, String)] {
        match self {
            Outcome::Clean(report) => &report.failed,
            Outcome::Compress(_) | Outcome::Restore(_) => &[],
        }
    }
}

/// Runs `command` against an already resolved configuration.
pub fn execute(config: &Config, command: &Commands) -> Result<Outcome, MetaError> {
    match command {
        Commands::Clean { .. } => clean::clean(config).map(Outcome::Clean),
        Commands::Compress { .. } => archive::compress(config).map(Outcome::Compress),
        Commands::Restore => restore::restore(config).map(Outcome::Restore),
    }
}

/// Builds the [`Config`] for `command` from the shared flags.
pub fn build_config(common: &CommonArgs, command: &Commands) -> Result<Config, MetaError> {
    let mut config = Config::new(cli::resolve_root(common.root.clone())?);
    match command {
        Commands::Clean { keep_going } => config.keep_going = *keep_going,
        Commands::Compress { keep_staging } => config.cleanup_on_failure = !*keep_staging,
        Commands::Restore => {}
    }
    Ok(config)
}

fn run(common: &CommonArgs, command: &Commands) -> Result<(), Box<dyn Error>> {
    logging::init(&LogConfig::from_verbosity(common.verbose, common.quiet));

    let config = build_config(common, command)?;
    let outcome = execute(&config, command)?;

    if common.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    if !outcome.is_success() {
        let failed: Vec<String> = outcome.failures().iter().map(|(p, _)| p.display().to_string()).collect();
        return Err(format!("{} meta file(s) could not be removed: {}", failed.len(), failed.join(", ")).into());
    }
    Ok(())
}

/// Diagnostic printed for a failed run. For aborted operations it lists the
/// files that were already processed, one per line.
fn failure_message(e: &(dyn Error + 'static)) -> String {
    let Some(meta) = e.downcast_ref::<MetaError>() else {
        return format!("Error: {}", e);
    };
    let mut msg = format!("Error ({}): {}", meta.class(), meta);
    if !meta.processed().is_empty() {
        msg.push_str("\nAlready processed:");
        for path in meta.processed() {
            msg.push_str("\n  ");
            msg.push_str(&path.display().to_string());
        }
    }
    msg
}

/// Maps a run result to the process exit status, printing a diagnostic on failure.
fn finish(result: Result<(), Box<dyn Error>>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

/// Entry point of the `metapack` binary.
pub fn run_cli_app() -> ExitCode {
    let cli = Cli::parse();
    finish(run(&cli.common, &cli.command))
}

/// Entry point of the `clean-meta` binary.
pub fn run_clean_app() -> ExitCode {
    let args = CleanArgs::parse();
    finish(run(&args.common, &Commands::Clean { keep_going: args.keep_going }))
}

/// Entry point of the `compress-meta` binary.
pub fn run_compress_app() -> ExitCode {
    let args = CompressArgs::parse();
    finish(run(&args.common, &Commands::Compress { keep_staging: args.keep_staging }))
}
