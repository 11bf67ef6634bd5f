//! Working-directory context and path resolution.
//!
//! Every operation receives a [`WorkingContext`] by reference instead of
//! consulting process-wide state, so independent callers can hold independent
//! working directories.

use std::ffi::OsString;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::spec::FsOpError;

/// Shell-like current directory used to resolve relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    path_dir_work: PathBuf,
}

impl WorkingContext {
    /// Context rooted at `path_dir_work`, normalized lexically.
    ///
    /// A relative `path_dir_work` is anchored at the process directory, which
    /// must be readable. No existence check happens here; use
    /// [`WorkingContext::change_directory`] for a validated switch.
    pub fn new<P: AsRef<Path>>(path_dir_work: P) -> Result<Self, FsOpError> {
        let path_dir_work = path_dir_work.as_ref();
        if path_dir_work.is_absolute() {
            return Ok(Self {
                path_dir_work: normalize_lexically(path_dir_work),
            });
        }
        let ctx_process = Self::from_process()?;
        Ok(Self {
            path_dir_work: ctx_process.resolve(path_dir_work),
        })
    }

    /// Context initialised from the OS-reported current directory.
    pub fn from_process() -> Result<Self, FsOpError> {
        let path_dir_work =
            std::env::current_dir().map_err(|e| FsOpError::from_read(".", e))?;
        Ok(Self {
            path_dir_work: normalize_lexically(&path_dir_work),
        })
    }

    /// `pwd`.
    pub fn show_work_directory(&self) -> &Path {
        &self.path_dir_work
    }

    /// `cd`: the target must exist and be a directory.
    pub fn change_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<(), FsOpError> {
        let path_target = self.resolve(path);
        let meta_target =
            std::fs::metadata(&path_target).map_err(|e| FsOpError::from_read(&path_target, e))?;
        if !meta_target.is_dir() {
            return Err(FsOpError::NotADirectory(path_target));
        }
        log::debug!(
            "Working directory changed: {} -> {}",
            self.path_dir_work.display(),
            path_target.display()
        );
        self.path_dir_work = path_target;
        Ok(())
    }

    /// Absolute, lexically normalized form of `path`.
    ///
    /// Relative input is joined onto the working directory. Pure path
    /// arithmetic, never touches the filesystem.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            return normalize_lexically(path);
        }
        normalize_lexically(&self.path_dir_work.join(path))
    }

    /// [`WorkingContext::resolve`] plus a trailing separator for existing directories.
    ///
    /// Paths that do not exist come back without the adjustment.
    pub fn complete_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path_resolved = self.resolve(path);
        if !path_resolved.is_dir() || has_trailing_separator(&path_resolved) {
            return path_resolved;
        }
        let mut raw: OsString = path_resolved.into_os_string();
        raw.push(MAIN_SEPARATOR_STR);
        PathBuf::from(raw)
    }
}

pub(crate) fn has_trailing_separator(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator)
}

/// Drop `.` segments and fold `..` into the preceding segment.
///
/// `..` at the root stays at the root.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(parent) = result.parent() {
                    result = parent.to_path_buf();
                }
            }
            _ => result.push(component),
        }
    }
    result
}
