//! Directory-level shell operations.

use std::fs;
use std::path::Path;

use crate::context::WorkingContext;
use crate::copy::copy_tree;
use crate::list::{format_long, format_names, list_one_level};
use crate::report::ReportCopy;
use crate::spec::{FsOpError, SpecCopyOptions, SpecDirectoryEntry};
use crate::tree::{build_tree, render_text_tree};
use crate::util::is_same_parent;

/// `mkdir -p`: create `dirname` and any missing parents. Idempotent.
pub fn create_directory<P: AsRef<Path>>(
    ctx: &WorkingContext,
    dirname: P,
) -> Result<(), FsOpError> {
    let path_dir = ctx.resolve(dirname);
    if path_dir.exists() && !path_dir.is_dir() {
        return Err(FsOpError::AlreadyExists(path_dir));
    }
    fs::create_dir_all(&path_dir).map_err(|e| FsOpError::from_write(&path_dir, e))?;
    log::debug!("Created directory {}", path_dir.display());
    Ok(())
}

/// `rm -rf`: remove `dirname` and everything below it.
///
/// Refuses plain files with [`FsOpError::NotADirectory`].
pub fn delete_directory<P: AsRef<Path>>(
    ctx: &WorkingContext,
    dirname: P,
) -> Result<(), FsOpError> {
    let path_dir = ctx.resolve(dirname);
    let meta_dir =
        fs::symlink_metadata(&path_dir).map_err(|e| FsOpError::from_read(&path_dir, e))?;
    if !meta_dir.is_dir() {
        return Err(FsOpError::NotADirectory(path_dir));
    }
    fs::remove_dir_all(&path_dir).map_err(|e| FsOpError::from_write(&path_dir, e))?;
    log::info!("Deleted directory {}", path_dir.display());
    Ok(())
}

/// Structured one-level listing, see [`list_one_level`].
pub fn list_directory_contents<P: AsRef<Path>>(
    ctx: &WorkingContext,
    dirname: P,
) -> Result<Vec<SpecDirectoryEntry>, FsOpError> {
    list_one_level(ctx, dirname)
}

/// `ls`: entry names, each followed by a tab.
pub fn list_directory<P: AsRef<Path>>(
    ctx: &WorkingContext,
    dirname: P,
) -> Result<String, FsOpError> {
    Ok(format_names(&list_one_level(ctx, dirname)?))
}

/// `ls -l`: `mode \t size \t mtime \t name` per entry, one line each.
pub fn list_directory_long<P: AsRef<Path>>(
    ctx: &WorkingContext,
    dirname: P,
) -> Result<String, FsOpError> {
    Ok(format_long(&list_one_level(ctx, dirname)?))
}

/// `tree`: indented text rendering of the whole subtree.
pub fn tree_directory<P: AsRef<Path>>(
    ctx: &WorkingContext,
    dirname: P,
) -> Result<String, FsOpError> {
    render_text_tree(ctx, dirname)
}

/// Entry tree of `dirname` with `children` populated on every directory.
pub fn tree_directory_contents<P: AsRef<Path>>(
    ctx: &WorkingContext,
    dirname: P,
) -> Result<SpecDirectoryEntry, FsOpError> {
    build_tree(ctx, dirname)
}

/// `cp -r src dst`: lands in `dst/<basename(src)>`.
pub fn copy_directory_into<P, Q>(
    ctx: &WorkingContext,
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    copy_tree(ctx, dir_source, dir_destination, spec_cp_options)
}

/// Rename a directory in place through the OS rename primitive.
///
/// Both paths must share a parent directory, otherwise
/// [`FsOpError::SamePathRenameRequired`]; moving elsewhere is
/// [`crate::move_directory`]'s job.
pub fn rename_directory<P, Q>(
    ctx: &WorkingContext,
    old_name: P,
    new_name: Q,
) -> Result<(), FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_old = ctx.resolve(old_name);
    let path_new = ctx.resolve(new_name);

    if !is_same_parent(&path_old, &path_new) {
        return Err(FsOpError::SamePathRenameRequired {
            source: path_old,
            destination: path_new,
        });
    }
    let meta_old = fs::metadata(&path_old).map_err(|e| FsOpError::from_read(&path_old, e))?;
    if !meta_old.is_dir() {
        return Err(FsOpError::NotADirectory(path_old));
    }
    if fs::symlink_metadata(&path_new).is_ok() {
        return Err(FsOpError::AlreadyExists(path_new));
    }

    fs::rename(&path_old, &path_new).map_err(|e| FsOpError::from_write(&path_old, e))?;
    log::info!("Renamed {} -> {}", path_old.display(), path_new.display());
    Ok(())
}
