//! Recursive directory copy and cross-directory move.

use std::fs;
use std::path::{Path, PathBuf};

use crate::context::WorkingContext;
use crate::folder::delete_directory;
use crate::list::read_directory_entries;
use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{
    EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy, EnumCopySymlinkStrategy,
    FsOpError, SpecCopyOptions, SpecDirectoryEntry,
};
use crate::util::{
    SpecCopyFilters, apply_file_metadata, base_name, copy_file_contents, create_symbolic_link,
    is_overlap,
};

#[derive(Debug)]
struct SpecCopyContext {
    spec_cp_options: SpecCopyOptions,
    spec_cp_filters: SpecCopyFilters,
    builder_cp_report: ReportCopyBuilder,
}

impl SpecCopyContext {
    fn new(spec_cp_options: SpecCopyOptions) -> Result<Self, FsOpError> {
        let spec_cp_filters = SpecCopyFilters::from_options(&spec_cp_options)?;
        Ok(Self {
            spec_cp_options,
            spec_cp_filters,
            builder_cp_report: ReportCopyBuilder::default(),
        })
    }
}

/// `cp -r src dst`: copy `dir_source` into `dir_destination/<basename(dir_source)>`.
///
/// Copying `/a/b` into `/c` produces `/c/b`. The destination directory is
/// created (with parents) first, so an empty source still yields an empty
/// copy. The walk stops at the first error and leaves whatever was already
/// written in place.
pub fn copy_tree<P, Q>(
    ctx: &WorkingContext,
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = ctx.resolve(dir_source);
    ensure_source_directory(&path_dir_src)?;
    let path_dir_dst = ctx.resolve(dir_destination).join(base_name(&path_dir_src));

    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(FsOpError::SourceDestinationOverlap {
            source: path_dir_src,
            destination: path_dir_dst,
        });
    }

    let mut spec_cp_ctx = SpecCopyContext::new(spec_cp_options)?;
    if should_skip_dir_conflict(&path_dir_dst, &mut spec_cp_ctx)? {
        return Ok(spec_cp_ctx.builder_cp_report.build());
    }
    walk_directory(&path_dir_src, &path_dir_dst, &mut spec_cp_ctx)?;

    let report_copy = spec_cp_ctx.builder_cp_report.build();
    log::info!(
        "Copied {} -> {}: {}",
        path_dir_src.display(),
        path_dir_dst.display(),
        report_copy
    );
    Ok(report_copy)
}

/// Replicate the contents of `dir_source` directly into `dir_destination`.
///
/// Unlike [`copy_tree`] no base name is appended. `dir_destination` and any
/// missing parents are created even when the source is empty; an existing
/// `dir_destination` goes through the directory conflict rule.
pub fn copy_directory<P, Q>(
    ctx: &WorkingContext,
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = ctx.resolve(dir_source);
    let path_dir_dst = ctx.resolve(dir_destination);
    ensure_source_directory(&path_dir_src)?;
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(FsOpError::SourceDestinationOverlap {
            source: path_dir_src,
            destination: path_dir_dst,
        });
    }

    let mut spec_cp_ctx = SpecCopyContext::new(spec_cp_options)?;
    if should_skip_dir_conflict(&path_dir_dst, &mut spec_cp_ctx)? {
        return Ok(spec_cp_ctx.builder_cp_report.build());
    }
    walk_directory(&path_dir_src, &path_dir_dst, &mut spec_cp_ctx)?;
    Ok(spec_cp_ctx.builder_cp_report.build())
}

/// Move directory `old` into directory `new` (`new/<basename(old)>`).
///
/// The landing spot must be a different parent directory: `new` resolving to
/// the parent of `old` fails with [`FsOpError::DifferentPathMoveRequired`],
/// that case is a rename and goes through [`crate::rename_directory`]. Moving
/// into a sibling (`mv x y/`) is allowed. If the copy succeeds but `old`
/// cannot be removed, both trees remain and
/// [`FsOpError::CleanupFailedAfterCopy`] is returned.
pub fn move_directory<P, Q>(
    ctx: &WorkingContext,
    old_dirname: P,
    new_dirname: Q,
) -> Result<ReportCopy, FsOpError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_old = ctx.resolve(old_dirname);
    let path_new = ctx.resolve(new_dirname);
    ensure_source_directory(&path_old)?;
    if path_old.parent() == Some(path_new.as_path()) {
        return Err(FsOpError::DifferentPathMoveRequired {
            source: path_old,
            destination: path_new,
        });
    }

    let report_copy = copy_tree(ctx, &path_old, &path_new, SpecCopyOptions::default())?;
    let path_moved = path_new.join(base_name(&path_old));
    delete_directory(ctx, &path_old).map_err(|e| FsOpError::CleanupFailedAfterCopy {
        source: path_old.clone(),
        destination: path_moved.clone(),
        message: e.to_string(),
    })?;

    log::info!("Moved {} -> {}", path_old.display(), path_moved.display());
    Ok(report_copy)
}

fn ensure_source_directory(path_dir_src: &Path) -> Result<(), FsOpError> {
    let meta_src =
        fs::metadata(path_dir_src).map_err(|e| FsOpError::from_read(path_dir_src, e))?;
    if !meta_src.is_dir() {
        return Err(FsOpError::NotADirectory(path_dir_src.to_path_buf()));
    }
    Ok(())
}

/// Destination entries are inspected without following links.
fn ensure_destination_directory(
    path_dir_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<(), FsOpError> {
    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta_dst) if meta_dst.file_type().is_symlink() => {
            Err(FsOpError::UnsafeDestination(path_dir_dst.to_path_buf()))
        }
        Ok(meta_dst) if meta_dst.is_dir() => Ok(()),
        Ok(_) => Err(FsOpError::AlreadyExists(path_dir_dst.to_path_buf())),
        Err(_) => {
            fs::create_dir_all(path_dir_dst)
                .map_err(|e| FsOpError::from_write(path_dir_dst, e))?;
            spec_cp_ctx.builder_cp_report.add_copied();
            Ok(())
        }
    }
}

/// `true` when the existing destination directory must not be entered.
fn should_skip_dir_conflict(
    path_dir_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<bool, FsOpError> {
    let Ok(meta_dst) = fs::symlink_metadata(path_dir_dst) else {
        return Ok(false);
    };
    if meta_dst.file_type().is_symlink() {
        return Err(FsOpError::UnsafeDestination(path_dir_dst.to_path_buf()));
    }
    if !meta_dst.is_dir() {
        return Err(FsOpError::AlreadyExists(path_dir_dst.to_path_buf()));
    }
    match spec_cp_ctx.spec_cp_options.rule_conflict_dir {
        EnumCopyDirectoryConflictStrategy::Merge => Ok(false),
        EnumCopyDirectoryConflictStrategy::Skip => {
            log::debug!("Destination directory exists, skipped: {}", path_dir_dst.display());
            spec_cp_ctx.builder_cp_report.add_skipped();
            Ok(true)
        }
        EnumCopyDirectoryConflictStrategy::Error => {
            Err(FsOpError::AlreadyExists(path_dir_dst.to_path_buf()))
        }
    }
}

/// `true` when the existing destination file must be kept.
///
/// A destination link is never written through: `Overwrite` removes the link
/// itself so the new content lands inside the destination tree.
fn should_skip_file_conflict(
    path_file_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<bool, FsOpError> {
    let Ok(meta_dst) = fs::symlink_metadata(path_file_dst) else {
        return Ok(false);
    };
    if meta_dst.is_dir() {
        return Err(FsOpError::AlreadyExists(path_file_dst.to_path_buf()));
    }
    match spec_cp_ctx.spec_cp_options.rule_conflict_file {
        EnumCopyFileConflictStrategy::Overwrite => {
            if meta_dst.file_type().is_symlink() {
                fs::remove_file(path_file_dst)
                    .map_err(|e| FsOpError::from_write(path_file_dst, e))?;
                log::debug!("Replaced destination link {}", path_file_dst.display());
            }
            Ok(false)
        }
        EnumCopyFileConflictStrategy::Skip => {
            log::debug!("Destination file exists, skipped: {}", path_file_dst.display());
            spec_cp_ctx.builder_cp_report.add_skipped();
            Ok(true)
        }
        EnumCopyFileConflictStrategy::Error => {
            Err(FsOpError::AlreadyExists(path_file_dst.to_path_buf()))
        }
    }
}

fn walk_directory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<(), FsOpError> {
    ensure_source_directory(path_dir_src)?;
    ensure_destination_directory(path_dir_dst, spec_cp_ctx)?;

    for entry in read_directory_entries(path_dir_src)? {
        spec_cp_ctx.builder_cp_report.add_scanned();
        let path_src = path_dir_src.join(&entry.name);
        let path_dst = path_dir_dst.join(&entry.name);

        if entry.is_symlink {
            handle_symlink_entry(&entry, &path_src, &path_dst, spec_cp_ctx)?;
        } else if entry.is_directory {
            if !spec_cp_ctx.spec_cp_filters.filter_dirs.admits(&entry.name) {
                continue;
            }
            spec_cp_ctx.builder_cp_report.add_matched();
            if should_skip_dir_conflict(&path_dst, spec_cp_ctx)? {
                continue;
            }
            walk_directory(&path_src, &path_dst, spec_cp_ctx)?;
        } else {
            if !spec_cp_ctx.spec_cp_filters.filter_files.admits(&entry.name) {
                continue;
            }
            spec_cp_ctx.builder_cp_report.add_matched();
            handle_file_entry(&path_src, &path_dst, spec_cp_ctx)?;
        }
    }
    Ok(())
}

fn handle_file_entry(
    path_file_src: &Path,
    path_file_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<(), FsOpError> {
    if should_skip_file_conflict(path_file_dst, spec_cp_ctx)? {
        return Ok(());
    }

    let if_create_new =
        spec_cp_ctx.spec_cp_options.rule_conflict_file != EnumCopyFileConflictStrategy::Overwrite;
    let n_bytes = copy_file_contents(path_file_src, path_file_dst, if_create_new)?;
    if spec_cp_ctx.spec_cp_options.if_preserve_metadata {
        apply_file_metadata(
            path_file_src,
            path_file_dst,
            &mut spec_cp_ctx.builder_cp_report,
        )?;
    }
    spec_cp_ctx.builder_cp_report.add_copied_file(n_bytes);
    log::debug!(
        "Copied file {} -> {} ({n_bytes} bytes)",
        path_file_src.display(),
        path_file_dst.display()
    );
    Ok(())
}

fn handle_symlink_entry(
    entry: &SpecDirectoryEntry,
    path_src: &Path,
    path_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<(), FsOpError> {
    let b_points_to_dir = path_src.is_dir();
    let filter_name = if b_points_to_dir {
        &spec_cp_ctx.spec_cp_filters.filter_dirs
    } else {
        &spec_cp_ctx.spec_cp_filters.filter_files
    };
    if !filter_name.admits(&entry.name) {
        return Ok(());
    }
    spec_cp_ctx.builder_cp_report.add_matched();

    match spec_cp_ctx.spec_cp_options.rule_symlink {
        EnumCopySymlinkStrategy::SkipSymlinks => {
            spec_cp_ctx.builder_cp_report.add_skipped();
            Ok(())
        }
        EnumCopySymlinkStrategy::CopySymlinks => {
            if should_skip_file_conflict(path_dst, spec_cp_ctx)? {
                return Ok(());
            }
            if fs::symlink_metadata(path_dst).is_ok() {
                fs::remove_file(path_dst).map_err(|e| FsOpError::from_write(path_dst, e))?;
            }
            create_symbolic_link(path_src, path_dst)?;
            spec_cp_ctx.builder_cp_report.add_copied();
            Ok(())
        }
        EnumCopySymlinkStrategy::Dereference => {
            let meta_target =
                fs::metadata(path_src).map_err(|e| FsOpError::from_read(path_src, e))?;
            if !meta_target.is_file() {
                return Err(FsOpError::NotAFile(PathBuf::from(path_src)));
            }
            handle_file_entry(path_src, path_dst, spec_cp_ctx)
        }
    }
}
