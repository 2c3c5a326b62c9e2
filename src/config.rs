//! Run configuration shared by every operation.
//!
//! The working root is carried explicitly in [`Config`]; nothing in the crate
//! changes the process working directory.

use std::path::{Path, PathBuf};

use crate::MetaError;

/// File name suffix selecting the files every operation acts on.
pub const META_SUFFIX: &str = ".meta";

/// Name of the transient staging directory, created directly under the root.
pub const STAGING_DIR_NAME: &str = ".meta-staging";

/// Name of the archive written directly under the root.
pub const ARCHIVE_NAME: &str = "MetaFilesCompressed.zip";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory all relative paths are resolved against.
    pub root: PathBuf,
    /// Remove the archiver's staging directory when a run fails.
    pub cleanup_on_failure: bool,
    /// Let the cleaner continue past files it cannot remove.
    pub keep_going: bool,
}

impl Config {
    /// Configuration with default options for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cleanup_on_failure: true,
            keep_going: false,
        }
    }

    pub fn staging_path(&self) -> PathBuf {
        self.root.join(STAGING_DIR_NAME)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_NAME)
    }

    /// Fails with [`MetaError::InvalidRoot`] unless the root is an existing directory.
    pub fn validate(&self) -> Result<(), MetaError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(MetaError::InvalidRoot(self.root.clone()))
        }
    }

    /// `path` relative to the root.
    pub fn relative<'a>(&self, path: &'a Path) -> Result<&'a Path, MetaError> {
        path.strip_prefix(&self.root).map_err(|_| MetaError::StripPrefix {
            prefix: self.root.clone(),
            path: path.to_path_buf(),
        })
    }
}
