use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `metapack` crate.
#[derive(Debug, Error)]
pub enum MetaError {
    /// An I/O error occurred, typically while reading, copying or removing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory walk could not read an entry.
    #[error("Could not walk '{}': {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// An error from the underlying `zip` crate while writing or reading the archive.
    #[error("Zip error on '{}': {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// An error occurred when trying to strip the root prefix from a walked path.
    #[error("Could not strip prefix '{}' from path '{}'", .prefix.display(), .path.display())]
    StripPrefix { prefix: PathBuf, path: PathBuf },

    /// The working root does not exist or is not a directory.
    #[error("Working root '{}' is not a directory", .0.display())]
    InvalidRoot(PathBuf),

    /// There is no archive to restore from.
    #[error("Archive '{}' not found", .0.display())]
    ArchiveNotFound(PathBuf),

    /// A meta file name is not valid UTF-8 and has no faithful zip entry name.
    #[error("File name '{}' is not valid UTF-8", .0.display())]
    NonUtf8Name(PathBuf),

    /// An archive entry would be written outside the working root.
    #[error("Refusing to extract unsafe archive entry '{0}'")]
    UnsafeEntry(String),

    /// An operation stopped part way. `processed` lists the root-relative paths
    /// that were already handled before `source` happened.
    #[error("{source} (aborted after {} file(s) processed)", .processed.len())]
    Aborted {
        processed: Vec<PathBuf>,
        #[source]
        source: Box<MetaError>,
    },

    /// The archiver failed and, as requested, left its staging directory behind.
    #[error("{source}; staging directory left at '{}'", .staging.display())]
    PartialState {
        staging: PathBuf,
        #[source]
        source: Box<MetaError>,
    },
}

/// Coarse classification used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Permission, lock or missing path problems.
    FilesystemAccess,
    /// The staging directory or output archive was left in an inconsistent state.
    PartialState,
    /// The archive container itself could not be written or read.
    Archive,
    /// Bad root or untrusted archive content.
    InvalidInput,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorClass::FilesystemAccess => "filesystem access error",
            ErrorClass::PartialState => "partial state error",
            ErrorClass::Archive => "archive error",
            ErrorClass::InvalidInput => "invalid input",
        };
        f.write_str(name)
    }
}

impl MetaError {
    /// Build an [`MetaError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MetaError::Io { path: path.into(), source }
    }

    pub(crate) fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        MetaError::Zip { path: path.into(), source }
    }

    pub(crate) fn aborted(processed: Vec<PathBuf>, source: MetaError) -> Self {
        MetaError::Aborted { processed, source: Box::new(source) }
    }

    /// Classify the error. Wrappers report the class of their cause, except
    /// [`MetaError::PartialState`] which is always a partial state error.
    pub fn class(&self) -> ErrorClass {
        match self {
            MetaError::Io { .. } | MetaError::Walk { .. } | MetaError::StripPrefix { .. } => {
                ErrorClass::FilesystemAccess
            }
            MetaError::Zip { .. } => ErrorClass::Archive,
            MetaError::InvalidRoot(_)
            | MetaError::ArchiveNotFound(_)
            | MetaError::UnsafeEntry(_)
            | MetaError::NonUtf8Name(_) => {
                ErrorClass::InvalidInput
            }
            MetaError::Aborted { source, .. } => source.class(),
            MetaError::PartialState { .. } => ErrorClass::PartialState,
        }
    }

    /// Root-relative paths handled before the failure, if the error tracks them.
    pub fn processed(&self) -> &[PathBuf] {
        match self {
            MetaError::Aborted { processed, .. } => processed,
            MetaError::PartialState { source, .. } => source.processed(),
            _ => &[],
        }
    }
}

impl From<walkdir::Error> for MetaError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        MetaError::Walk { path, source: err }
    }
}
