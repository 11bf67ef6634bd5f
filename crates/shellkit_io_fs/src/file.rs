//! Single-file shell operations and existence checks.

use std::fs;
use std::path::{Path, PathBuf};

use crate::context::WorkingContext;
use crate::spec::FsOpError;
use crate::util::{copy_file_contents, is_same_parent};

/// Something is at `path`; a dangling link counts.
pub fn exists<P: AsRef<Path>>(ctx: &WorkingContext, path: P) -> bool {
    fs::symlink_metadata(ctx.resolve(path)).is_ok()
}

/// `path` is a directory, following links.
pub fn is_directory<P: AsRef<Path>>(ctx: &WorkingContext, path: P) -> bool {
    ctx.resolve(path).is_dir()
}

/// `path` is a regular file, following links.
pub fn is_file<P: AsRef<Path>>(ctx: &WorkingContext, path: P) -> bool {
    ctx.resolve(path).is_file()
}

/// Resolve `path` and require it to be an existing regular file.
fn resolve_existing_file(ctx: &WorkingContext, path: &Path) -> Result<PathBuf, FsOpError> {
    let path_file = ctx.resolve(path);
    let meta_file = fs::metadata(&path_file).map_err(|e| FsOpError::from_read(&path_file, e))?;
    if !meta_file.is_file() {
        return Err(FsOpError::NotAFile(path_file));
    }
    Ok(path_file)
}

/// `touch`: create an empty file.
///
/// An existing file is an error unless `if_override`, in which case it is truncated.
pub fn create_file<P: AsRef<Path>>(
    ctx: &WorkingContext,
    filename: P,
    if_override: bool,
) -> Result<(), FsOpError> {
    let path_file = ctx.resolve(filename);
    if let Ok(meta_file) = fs::symlink_metadata(&path_file) {
        if !if_override || meta_file.is_dir() {
            return Err(FsOpError::AlreadyExists(path_file));
        }
    }
    fs::File::create(&path_file).map_err(|e| FsOpError::from_write(&path_file, e))?;
    log::debug!("Created file {}", path_file.display());
    Ok(())
}

/// Replace the content of an existing file.
pub fn write_file<P, C>(ctx: &WorkingContext, filename: P, content: C) -> Result<(), FsOpError>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    let path_file = resolve_existing_file(ctx, filename.as_ref())?;
    fs::write(&path_file, content).map_err(|e| FsOpError::from_write(&path_file, e))
}

/// Whole content of a file.
pub fn read_file<P: AsRef<Path>>(
    ctx: &WorkingContext,
    filename: P,
) -> Result<Vec<u8>, FsOpError> {
    let path_file = resolve_existing_file(ctx, filename.as_ref())?;
    fs::read(&path_file).map_err(|e| FsOpError::from_read(&path_file, e))
}

/// Whole content of a UTF-8 text file.
pub fn read_file_to_string<P: AsRef<Path>>(
    ctx: &WorkingContext,
    filename: P,
) -> Result<String, FsOpError> {
    let path_file = resolve_existing_file(ctx, filename.as_ref())?;
    fs::read_to_string(&path_file).map_err(|e| FsOpError::from_read(&path_file, e))
}

pub fn delete_file<P: AsRef<Path>>(
    ctx: &WorkingContext,
    filename: P,
) -> Result<(), FsOpError> {
    let path_file = resolve_existing_file(ctx, filename.as_ref())?;
    fs::remove_file(&path_file).map_err(|e| FsOpError::from_write(&path_file, e))?;
    log::debug!("Deleted file {}", path_file.display());
    Ok(())
}

/// Buffered copy to a destination that must not exist yet.
pub fn copy_file<P, Q>(
    ctx: &WorkingContext,
    old_filename: P,
    new_filename: Q,
) -> Result<(), FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_old = resolve_existing_file(ctx, old_filename.as_ref())?;
    let path_new = ctx.resolve(new_filename);
    copy_file_contents(&path_old, &path_new, true)?;
    Ok(())
}

/// Rename within the same directory.
pub fn rename_file<P, Q>(
    ctx: &WorkingContext,
    old_filename: P,
    new_filename: Q,
) -> Result<(), FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_old = ctx.resolve(old_filename);
    let path_new = ctx.resolve(new_filename);
    if !is_same_parent(&path_old, &path_new) {
        return Err(FsOpError::SamePathRenameRequired {
            source: path_old,
            destination: path_new,
        });
    }
    rename_existing_file(path_old, path_new)
}

/// Move to `new_filename` (full target path) in a different directory.
pub fn move_file<P, Q>(
    ctx: &WorkingContext,
    old_filename: P,
    new_filename: Q,
) -> Result<(), FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_old = ctx.resolve(old_filename);
    let path_new = ctx.resolve(new_filename);
    if is_same_parent(&path_old, &path_new) {
        return Err(FsOpError::DifferentPathMoveRequired {
            source: path_old,
            destination: path_new,
        });
    }
    rename_existing_file(path_old, path_new)
}

fn rename_existing_file(path_old: PathBuf, path_new: PathBuf) -> Result<(), FsOpError> {
    let meta_old =
        fs::symlink_metadata(&path_old).map_err(|e| FsOpError::from_read(&path_old, e))?;
    if meta_old.is_dir() {
        return Err(FsOpError::NotAFile(path_old));
    }
    if path_new.is_dir() {
        return Err(FsOpError::AlreadyExists(path_new));
    }
    fs::rename(&path_old, &path_new).map_err(|e| FsOpError::from_write(&path_old, e))?;
    log::debug!("Renamed file {} -> {}", path_old.display(), path_new.display());
    Ok(())
}
