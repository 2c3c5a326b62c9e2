use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::MetaError;

/// Environment variable consulted for the working root when `--root` is absent.
pub const ROOT_ENV: &str = "METAPACK_ROOT";

/// Flags shared by every command.
#[derive(Args, Clone, Debug, Default)]
pub struct CommonArgs {
    /// Project root to operate on. Defaults to $METAPACK_ROOT, then to the directory containing this executable.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Delete every `.meta` file under the root.
    #[command(alias = "d")]
    Clean {
        /// Continue past files that cannot be removed instead of stopping at the first one.
        #[arg(long)]
        keep_going: bool,
    },

    /// Copy every `.meta` file under the root into MetaFilesCompressed.zip.
    #[command(alias = "c")]
    Compress {
        /// Leave the staging directory on disk when the run fails.
        #[arg(long)]
        keep_staging: bool,
    },

    /// Extract MetaFilesCompressed.zip back into the root.
    #[command(alias = "x")]
    Restore,
}

/// Top-level arguments of the `metapack` binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "Clean, compress and restore .meta files", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments of the single-purpose `clean-meta` binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "Delete every .meta file under the project root", long_about = None)]
pub struct CleanArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Continue past files that cannot be removed instead of stopping at the first one.
    #[arg(long)]
    pub keep_going: bool,
}

/// Arguments of the single-purpose `compress-meta` binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "Bundle every .meta file under the project root into MetaFilesCompressed.zip", long_about = None)]
pub struct CompressArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Leave the staging directory on disk when the run fails.
    #[arg(long)]
    pub keep_staging: bool,
}

/// Resolves the working root.
///
/// Priority:
/// 1. `--root` command-line argument.
/// 2. `METAPACK_ROOT` environment variable.
/// 3. The directory containing the running executable.
pub fn resolve_root(root_opt: Option<PathBuf>) -> Result<PathBuf, MetaError> {
    if let Some(root) = root_opt {
        return Ok(root);
    }
    if let Some(root) = std::env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let exe = std::env::current_exe().map_err(|e| MetaError::io("<current executable>", e))?;
    exe.parent()
        .map(PathBuf::from)
        .ok_or(MetaError::InvalidRoot(exe))
}
