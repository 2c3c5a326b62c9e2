//! # Cleaner
//!
//! Removes every meta file below the working root. Deletions are immediate;
//! there is no dry-run mode.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::walk;
use crate::MetaError;

/// Outcome of a cleaner run. All paths are relative to the root.
#[derive(Debug, Default, Serialize)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    /// Files that could not be removed, with the reason. Only filled when
    /// [`Config::keep_going`] is set.
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes every meta file under `config.root`.
///
/// By default the first failure stops the walk and is returned as
/// [`MetaError::Aborted`], listing the files removed so far. With
/// `keep_going` failures are collected in the report instead.
pub fn clean(config: &Config) -> Result<CleanReport, MetaError> {
    clean_with(config, |path| fs::remove_file(path))
}

/// [`clean`] with the removal step supplied by the caller.
pub(crate) fn clean_with<F>(config: &Config, mut remove: F) -> Result<CleanReport, MetaError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    config.validate()?;
    info!(root = %config.root.display(), "deleting meta files");

    let mut report = CleanReport::default();
    for entry in walk::meta_files(&config.root, None) {
        match remove_one(config, entry, &mut remove) {
            Ok(rel) => {
                info!("{}", rel.display());
                report.removed.push(rel);
            }
            Err((rel, err)) if config.keep_going => {
                warn!(path = %rel.display(), error = %err, "could not remove meta file");
                report.failed.push((rel, err.to_string()));
            }
            Err((_, err)) => return Err(MetaError::aborted(report.removed, err)),
        }
    }

    if report.is_success() {
        info!(removed = report.removed.len(), "SUCCESS");
    } else {
        warn!(removed = report.removed.len(), failed = report.failed.len(), "finished with failures");
    }
    Ok(report)
}

fn remove_one<F>(
    config: &Config,
    entry: Result<PathBuf, MetaError>,
    remove: &mut F,
) -> Result<PathBuf, (PathBuf, MetaError)>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let path = entry.map_err(|e| (walk_error_path(config, &e), e))?;
    let rel = config
        .relative(&path)
        .map(PathBuf::from)
        .map_err(|e| (path.clone(), e))?;
    remove(&path).map_err(|e| (rel.clone(), MetaError::io(&path, e)))?;
    Ok(rel)
}

fn walk_error_path(config: &Config, err: &MetaError) -> PathBuf {
    match err {
        MetaError::Walk { path, .. } => config
            .relative(path)
            .map(PathBuf::from)
            .unwrap_or_else(|_| path.clone()),
        _ => PathBuf::new(),
    }
}
