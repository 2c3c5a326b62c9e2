//! # Archiver
//!
//! Bundles copies of every meta file below the working root into a single zip
//! archive, keeping the originals in place.
//!
//! A run goes through four strictly sequential stages:
//!
//! 1. **Clean slate**: a staging directory or archive left by an earlier run is removed.
//! 2. **Stage**: each meta file is copied to the same relative path under the staging
//!    directory. The staging directory itself is pruned from the walk.
//! 3. **Compress**: the staging tree is written to a temporary zip next to the final
//!    archive and renamed into place once complete, so the fixed output path never
//!    holds a partial archive.
//! 4. **Tear down**: the staging directory is removed.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::Config;
use crate::walk;
use crate::MetaError;

/// Outcome of an archiver run.
#[derive(Debug, Serialize)]
pub struct ArchiveReport {
    /// The archive written, or `None` when there was nothing to archive.
    pub archive: Option<PathBuf>,
    /// Root-relative paths of the archived files, in archive order.
    pub files: Vec<PathBuf>,
    /// Total uncompressed size of the archived files.
    pub bytes: u64,
}

/// Copies every meta file under `config.root` into [`Config::archive_path`].
///
/// On failure the error is [`MetaError::Aborted`] with the files staged so far.
/// If [`Config::cleanup_on_failure`] is off and a staging directory exists, the
/// error is wrapped in [`MetaError::PartialState`] instead.
pub fn compress(config: &Config) -> Result<ArchiveReport, MetaError> {
    config.validate()?;
    let staging = config.staging_path();
    let archive = config.archive_path();

    remove_stale(&staging, &archive)?;

    info!(root = %config.root.display(), "collecting meta files");
    let mut staged = Vec::new();
    let outcome = stage(config, &staging, &mut staged).and_then(|()| {
        if staged.is_empty() {
            Ok(0)
        } else {
            info!(files = staged.len(), archive = %archive.display(), "compressing");
            write_archive(&staging, &archive)
        }
    });

    let bytes = match outcome {
        Ok(bytes) => bytes,
        Err(err) => return Err(fail(config, &staging, staged, err)),
    };

    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| MetaError::PartialState {
            staging: staging.clone(),
            source: Box::new(MetaError::io(&staging, e)),
        })?;
    }

    if staged.is_empty() {
        warn!("no meta files found, nothing archived");
        return Ok(ArchiveReport { archive: None, files: staged, bytes: 0 });
    }

    info!(files = staged.len(), bytes, "SUCCESS");
    Ok(ArchiveReport { archive: Some(archive), files: staged, bytes })
}

fn remove_stale(staging: &Path, archive: &Path) -> Result<(), MetaError> {
    if staging.exists() {
        info!(path = %staging.display(), "deleting old staging directory");
        fs::remove_dir_all(staging).map_err(|e| MetaError::io(staging, e))?;
    }
    if archive.exists() {
        info!(path = %archive.display(), "deleting old archive");
        fs::remove_file(archive).map_err(|e| MetaError::io(archive, e))?;
    }
    Ok(())
}

/// Copies the meta files into `staging`, pushing each root-relative path onto
/// `staged` once its copy is complete.
fn stage(config: &Config, staging: &Path, staged: &mut Vec<PathBuf>) -> Result<(), MetaError> {
    for entry in walk::meta_files(&config.root, Some(staging)) {
        let path = entry?;
        let rel = config.relative(&path)?.to_path_buf();
        walk::archive_name(&rel)?;
        let dest = staging.join(&rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| MetaError::io(parent, e))?;
        }
        fs::copy(&path, &dest).map_err(|e| MetaError::io(&path, e))?;
        info!("{}", rel.display());
        staged.push(rel);
    }
    Ok(())
}

/// Zips every file below `staging` into `archive`. Returns the number of
/// uncompressed bytes written.
fn write_archive(staging: &Path, archive: &Path) -> Result<u64, MetaError> {
    let parent = archive.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".metapack-")
        .suffix(".zip.part")
        .tempfile_in(parent)
        .map_err(|e| MetaError::io(parent, e))?;

    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut total = 0u64;
    {
        let mut zip = ZipWriter::new(BufWriter::new(tmp.as_file_mut()));
        for entry in WalkDir::new(staging).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(staging).map_err(|_| MetaError::StripPrefix {
                prefix: staging.to_path_buf(),
                path: entry.path().to_path_buf(),
            })?;
            let name = walk::archive_name(rel)?;
            debug!(entry = %name, "adding");
            zip.start_file(name, options).map_err(|e| MetaError::zip(archive, e))?;
            let mut src = File::open(entry.path()).map_err(|e| MetaError::io(entry.path(), e))?;
            total += io::copy(&mut src, &mut zip).map_err(|e| MetaError::io(entry.path(), e))?;
        }
        let mut out = zip.finish().map_err(|e| MetaError::zip(archive, e))?;
        out.flush().map_err(|e| MetaError::io(archive, e))?;
    }

    tmp.persist(archive).map_err(|e| MetaError::io(archive, e.error))?;
    Ok(total)
}

fn fail(config: &Config, staging: &Path, staged: Vec<PathBuf>, err: MetaError) -> MetaError {
    let err = MetaError::aborted(staged, err);
    if !staging.exists() {
        return err;
    }
    if config.cleanup_on_failure {
        debug!(path = %staging.display(), "removing staging directory after failure");
        if let Err(e) = fs::remove_dir_all(staging) {
            warn!(path = %staging.display(), error = %e, "could not remove staging directory");
            return MetaError::PartialState { staging: staging.to_path_buf(), source: Box::new(err) };
        }
        err
    } else {
        MetaError::PartialState { staging: staging.to_path_buf(), source: Box::new(err) }
    }
}
