//! Entry model, copy specification models and top-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy for recursive copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopySymlinkStrategy {
    /// Follow the link and copy the target bytes. The target must be a file.
    Dereference,
    /// Create a symbolic link at destination (do not copy target bytes).
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// Existing destination file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFileConflictStrategy {
    /// Keep destination file and skip current source file.
    Skip,
    /// Replace destination file content with source content.
    Overwrite,
    /// Abort the copy with [`FsOpError::AlreadyExists`].
    Error,
}

/// Existing destination directory conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyDirectoryConflictStrategy {
    /// Do not descend/copy into an already existing destination directory.
    Skip,
    /// Reuse destination directory and continue copying children into it.
    Merge,
    /// Abort the copy with [`FsOpError::AlreadyExists`].
    Error,
}

/// Pattern matching mode for include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EntryModel

/// One filesystem object as observed at listing time.
///
/// Entries are snapshots: nothing mutates them after construction, a fresh
/// listing is the only way to observe later changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDirectoryEntry {
    /// Base name. For a plain-file listing this is the caller-supplied path string.
    pub name: String,
    /// Entry is a directory (symlinks are never directories here).
    pub is_directory: bool,
    /// Entry itself is a symbolic link.
    pub is_symlink: bool,
    /// Display mode string, e.g. `drwxr-xr-x`.
    pub permission_string: String,
    /// Local modification time rendered as `Mon DD YYYY HH:MM:SS`.
    pub modified_at: String,
    /// Size in bytes, meaningful only for files.
    pub size_bytes: u64,
    /// Recursively discovered children.
    ///
    /// `Some` only for directories produced by the tree builder; flat listings
    /// and files carry `None`.
    pub children: Option<Vec<SpecDirectoryEntry>>,
}

impl SpecDirectoryEntry {
    /// Number of file leaves in this subtree (including `self` when it is a file).
    pub fn count_files(&self) -> usize {
        match &self.children {
            Some(children) => children.iter().map(SpecDirectoryEntry::count_files).sum(),
            None if self.is_directory => 0,
            None => 1,
        }
    }

    /// Number of entries below this node, recursively.
    pub fn count_descendants(&self) -> usize {
        self.children.as_ref().map_or(0, |children| {
            children
                .iter()
                .map(|child| 1 + child.count_descendants())
                .sum()
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::copy_tree`].
///
/// The default reproduces a plain `cp -r`: no filters, fail on existing
/// destination files, merge into existing directories, copy link targets.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Include patterns applied to file basename.
    pub patterns_include_files: Option<Vec<String>>,
    /// Exclude patterns applied to file basename.
    pub patterns_exclude_files: Option<Vec<String>>,
    /// Include patterns applied to directory basename.
    pub patterns_include_dirs: Option<Vec<String>>,
    /// Exclude patterns applied to directory basename.
    pub patterns_exclude_dirs: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumCopyPatternMode,
    /// Conflict behavior for destination files.
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    /// Conflict behavior for destination directories.
    pub rule_conflict_dir: EnumCopyDirectoryConflictStrategy,
    /// Symlink handling behavior.
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Copy permissions, timestamps and extended attributes of files.
    pub if_preserve_metadata: bool,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            patterns_include_files: None,
            patterns_exclude_files: None,
            patterns_include_dirs: None,
            patterns_exclude_dirs: None,
            rule_pattern: EnumCopyPatternMode::Glob,
            rule_conflict_file: EnumCopyFileConflictStrategy::Error,
            rule_conflict_dir: EnumCopyDirectoryConflictStrategy::Merge,
            rule_symlink: EnumCopySymlinkStrategy::Dereference,
            if_preserve_metadata: false,
        }
    }
}

/// Errors returned by every filesystem operation.
#[derive(Debug)]
pub enum FsOpError {
    /// Path does not exist.
    NotFound(PathBuf),
    /// Path exists but is not a directory.
    NotADirectory(PathBuf),
    /// Path exists but is not a regular file.
    NotAFile(PathBuf),
    /// Destination already exists.
    AlreadyExists(PathBuf),
    /// Path exists but could not be read or enumerated.
    ReadFailure {
        /// Path being read.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Creating, writing, renaming or removing failed.
    WriteFailure {
        /// Path being mutated.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Rename target must share the parent directory of the source.
    SamePathRenameRequired {
        /// Resolved source path.
        source: PathBuf,
        /// Resolved destination path.
        destination: PathBuf,
    },
    /// Move target must not share the parent directory of the source.
    DifferentPathMoveRequired {
        /// Resolved source path.
        source: PathBuf,
        /// Resolved destination path.
        destination: PathBuf,
    },
    /// Move copied the tree but could not remove the source; both trees exist.
    CleanupFailedAfterCopy {
        /// Source tree that could not be removed.
        source: PathBuf,
        /// Destination tree that was fully written.
        destination: PathBuf,
        /// Underlying delete error text.
        message: String,
    },
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    SourceDestinationOverlap {
        /// Normalized source directory.
        source: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// A destination entry inside the copy root is a symbolic link; writing
    /// through it would land outside the destination tree.
    UnsafeDestination(PathBuf),
    /// Invalid include/exclude pattern.
    InvalidPattern(String),
}

impl FsOpError {
    /// Classify an IO error raised while reading `path`.
    pub(crate) fn from_read(path: impl Into<PathBuf>, e: io::Error) -> Self {
        let path = path.into();
        if e.kind() == io::ErrorKind::NotFound {
            return Self::NotFound(path);
        }
        Self::ReadFailure {
            path,
            message: e.to_string(),
        }
    }

    /// Wrap an IO error raised while mutating `path`.
    pub(crate) fn from_write(path: impl Into<PathBuf>, e: io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            message: e.to_string(),
        }
    }

    /// The path the failing operation stopped at.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::NotFound(path)
            | Self::NotADirectory(path)
            | Self::NotAFile(path)
            | Self::AlreadyExists(path)
            | Self::UnsafeDestination(path)
            | Self::ReadFailure { path, .. }
            | Self::WriteFailure { path, .. } => Some(path),
            Self::SamePathRenameRequired { source, .. }
            | Self::DifferentPathMoveRequired { source, .. }
            | Self::CleanupFailedAfterCopy { source, .. }
            | Self::SourceDestinationOverlap { source, .. } => Some(source),
            Self::InvalidPattern(_) => None,
        }
    }
}

impl fmt::Display for FsOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "No such file or directory: {}", path.display()),
            Self::NotADirectory(path) => write!(f, "Not a directory: {}", path.display()),
            Self::NotAFile(path) => write!(f, "Not a file: {}", path.display()),
            Self::AlreadyExists(path) => write!(f, "Already exists: {}", path.display()),
            Self::ReadFailure { path, message } => {
                write!(f, "Failed to read {}: {message}", path.display())
            }
            Self::WriteFailure { path, message } => {
                write!(f, "Failed to write {}: {message}", path.display())
            }
            Self::SamePathRenameRequired {
                source,
                destination,
            } => write!(
                f,
                "Rename requires the same parent directory: {} -> {}",
                source.display(),
                destination.display()
            ),
            Self::DifferentPathMoveRequired {
                source,
                destination,
            } => write!(
                f,
                "Move requires a different parent directory (use rename): {} -> {}",
                source.display(),
                destination.display()
            ),
            Self::CleanupFailedAfterCopy {
                source,
                destination,
                message,
            } => write!(
                f,
                "Copied {} to {} but failed to remove the source: {message}",
                source.display(),
                destination.display()
            ),
            Self::SourceDestinationOverlap {
                source,
                destination,
            } => write!(
                f,
                "Source and destination directories overlap: {} <-> {}",
                source.display(),
                destination.display()
            ),
            Self::UnsafeDestination(path) => write!(
                f,
                "Unsafe destination path traverses symlink component: {}",
                path.display()
            ),
            Self::InvalidPattern(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FsOpError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
