//! Directory walk shared by the cleaner and the archiver.

use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::META_SUFFIX;
use crate::MetaError;

/// Returns true for non-directory entries whose name ends with [`META_SUFFIX`].
fn is_meta(entry: &DirEntry) -> bool {
    !entry.file_type().is_dir() && entry.file_name().to_string_lossy().ends_with(META_SUFFIX)
}

/// Walks `root` recursively and yields the path of every meta file.
///
/// Entries are visited in file name order so repeated runs see the same
/// sequence. Symlinks are not followed. When `exclude` is set that subtree is
/// pruned from the walk entirely.
pub fn meta_files(
    root: &Path,
    exclude: Option<&Path>,
) -> impl Iterator<Item = Result<PathBuf, MetaError>> {
    let exclude = exclude.map(Path::to_path_buf);
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| exclude.as_deref() != Some(e.path()))
        .filter_map(|entry| match entry {
            Ok(e) if is_meta(&e) => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(err) => Some(Err(MetaError::from(err))),
        })
}

/// Zip entry name for a root-relative path: normal components joined with `/`.
/// `./` and similar components are dropped. Names that are not valid UTF-8
/// fail with [`MetaError::NonUtf8Name`]; they cannot be stored in the archive
/// without changing them.
pub fn archive_name(rel: &Path) -> Result<String, MetaError> {
    let parts = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| MetaError::NonUtf8Name(rel.to_path_buf()))?;
    Ok(parts.join("/"))
}
