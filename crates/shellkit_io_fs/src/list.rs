//! One-level directory listing with per-entry metadata.

use std::fs;
use std::path::Path;

use crate::context::WorkingContext;
use crate::spec::{FsOpError, SpecDirectoryEntry};
use crate::util::{format_modified_at, format_permission_string};

/// List one level of `path`.
///
/// A directory yields its entries in directory-stream order (unsorted). A
/// plain file yields a single entry whose `name` is `path` exactly as the
/// caller wrote it, not its base name.
pub fn list_one_level<P: AsRef<Path>>(
    ctx: &WorkingContext,
    path: P,
) -> Result<Vec<SpecDirectoryEntry>, FsOpError> {
    let path_abs = ctx.complete_path(path.as_ref());
    let meta_abs = fs::metadata(&path_abs).map_err(|e| FsOpError::from_read(&path_abs, e))?;

    if meta_abs.is_dir() {
        return read_directory_entries(&path_abs);
    }
    Ok(vec![describe_entry(
        path.as_ref().to_string_lossy().to_string(),
        &meta_abs,
    )])
}

/// Entries directly inside `path_dir`, observed without following links.
pub(crate) fn read_directory_entries(
    path_dir: &Path,
) -> Result<Vec<SpecDirectoryEntry>, FsOpError> {
    let iter_entries = fs::read_dir(path_dir).map_err(|e| FsOpError::from_read(path_dir, e))?;

    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| FsOpError::ReadFailure {
            path: path_dir.to_path_buf(),
            message: format!("Failed to read directory entry ({e})"),
        })?;
        let path_entry = entry.path();
        let meta_entry = fs::symlink_metadata(&path_entry).map_err(|e| {
            FsOpError::ReadFailure {
                path: path_entry.clone(),
                message: e.to_string(),
            }
        })?;
        l_entries.push(describe_entry(
            entry.file_name().to_string_lossy().to_string(),
            &meta_entry,
        ));
    }
    log::debug!("Listed {} entries under {}", l_entries.len(), path_dir.display());
    Ok(l_entries)
}

/// Snapshot of one object from its metadata.
pub(crate) fn describe_entry(name: String, meta: &fs::Metadata) -> SpecDirectoryEntry {
    let file_type = meta.file_type();
    SpecDirectoryEntry {
        name,
        is_directory: file_type.is_dir(),
        is_symlink: file_type.is_symlink(),
        permission_string: format_permission_string(meta),
        modified_at: format_modified_at(meta),
        size_bytes: if file_type.is_dir() { 0 } else { meta.len() },
        children: None,
    }
}

/// `ls`: every entry name followed by a tab.
pub fn format_names(l_entries: &[SpecDirectoryEntry]) -> String {
    l_entries
        .iter()
        .map(|entry| format!("{}\t", entry.name))
        .collect()
}

/// `ls -l`: `mode \t size \t mtime \t name` per line.
pub fn format_long(l_entries: &[SpecDirectoryEntry]) -> String {
    l_entries
        .iter()
        .map(|entry| {
            format!(
                "{}\t{}\t{}\t{}\n",
                entry.permission_string, entry.size_bytes, entry.modified_at, entry.name
            )
        })
        .collect()
}
