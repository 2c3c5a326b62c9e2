//! Restores meta files from the archive written by [`crate::archive::compress`].

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::config::Config;
use crate::MetaError;

#[derive(Debug, Default, Serialize)]
pub struct RestoreReport {
    /// Root-relative paths written from the archive.
    pub files: Vec<PathBuf>,
}

/// Extracts every file entry of [`Config::archive_path`] into the root,
/// overwriting files that already exist. Directory entries only create
/// directories. An entry that would land outside the root aborts the run.
pub fn restore(config: &Config) -> Result<RestoreReport, MetaError> {
    config.validate()?;
    let archive_path = config.archive_path();
    if !archive_path.is_file() {
        return Err(MetaError::ArchiveNotFound(archive_path));
    }

    info!(archive = %archive_path.display(), "extracting meta files");
    let file = File::open(&archive_path).map_err(|e| MetaError::io(&archive_path, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| MetaError::zip(&archive_path, e))?;

    let mut report = RestoreReport::default();
    for i in 0..zip.len() {
        let extracted = extract_entry(config, &mut zip, i);
        match extracted {
            Ok(Some(rel)) => {
                info!("{}", rel.display());
                report.files.push(rel);
            }
            Ok(None) => {}
            Err(err) => return Err(MetaError::aborted(report.files, err)),
        }
    }

    info!(files = report.files.len(), "SUCCESS");
    Ok(report)
}

/// Writes entry `index` below the root. Returns the relative path for file
/// entries and `None` for directories.
fn extract_entry(
    config: &Config,
    zip: &mut ZipArchive<File>,
    index: usize,
) -> Result<Option<PathBuf>, MetaError> {
    let archive_path = config.archive_path();
    let mut entry = zip.by_index(index).map_err(|e| MetaError::zip(&archive_path, e))?;
    let rel = entry
        .enclosed_name()
        .map(PathBuf::from)
        .ok_or_else(|| MetaError::UnsafeEntry(entry.name().to_string()))?;
    let dest = config.root.join(&rel);

    if entry.is_dir() {
        debug!(path = %rel.display(), "creating directory");
        fs::create_dir_all(&dest).map_err(|e| MetaError::io(&dest, e))?;
        return Ok(None);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| MetaError::io(parent, e))?;
    }
    let mut out = File::create(&dest).map_err(|e| MetaError::io(&dest, e))?;
    io::copy(&mut entry, &mut out).map_err(|e| MetaError::io(&dest, e))?;
    Ok(Some(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_archive(config: &Config, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(config.archive_path()).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn writes_entries_and_overwrites_existing() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path());
        build_archive(&config, &[("a/x.meta", b"new x"), ("a/b/y.meta", b"y")]);
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/x.meta"), b"old x").unwrap();

        let report = restore(&config).unwrap();

        assert_eq!(report.files, vec![PathBuf::from("a/x.meta"), PathBuf::from("a/b/y.meta")]);
        assert_eq!(fs::read(dir.path().join("a/x.meta")).unwrap(), b"new x");
        assert_eq!(fs::read(dir.path().join("a/b/y.meta")).unwrap(), b"y");
    }

    #[test]
    fn missing_archive_is_reported() {
        let dir = tempdir().unwrap();
        let err = restore(&Config::new(dir.path())).unwrap_err();
        assert!(matches!(err, MetaError::ArchiveNotFound(_)));
        assert_eq!(err.class(), crate::ErrorClass::InvalidInput);
    }

    #[test]
    fn entries_escaping_the_root_are_refused() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        let config = Config::new(&root);
        build_archive(&config, &[("ok.meta", b"1"), ("../evil.meta", b"2")]);

        let err = restore(&config).unwrap_err();

        assert!(matches!(&err, MetaError::Aborted { source, .. } if matches!(**source, MetaError::UnsafeEntry(_))));
        assert_eq!(err.processed(), &[PathBuf::from("ok.meta")]);
        assert!(!dir.path().join("evil.meta").exists());
    }
}
