//! `shellkit_io_fs` v1:
//! Shell-style filesystem operations bound to an explicit working directory.
//!
//! Layout:
//! - `context` : working directory and path resolution
//! - `list`    : one-level listing and `ls`/`ls -l` rendering
//! - `tree`    : recursive text tree and entry tree
//! - `copy`    : recursive copy and cross-directory move
//! - `folder`  : `mkdir -p`, `rm -rf`, directory rename
//! - `file`    : single-file create/read/write/copy/rename/move
//! - `spec`    : entry model, enums, options, errors
//! - `report`  : copy run report
//! - `util`    : shared helper functions

pub mod context;
pub mod copy;
pub mod file;
pub mod folder;
pub mod list;
pub mod report;
pub mod spec;
pub mod tree;
mod util;

pub use context::WorkingContext;
pub use copy::{copy_directory, copy_tree, move_directory};
pub use file::{
    copy_file, create_file, delete_file, exists, is_directory, is_file, move_file, read_file,
    read_file_to_string, rename_file, write_file,
};
pub use folder::{
    copy_directory_into, create_directory, delete_directory, list_directory,
    list_directory_contents, list_directory_long, rename_directory, tree_directory,
    tree_directory_contents,
};
pub use list::{format_long, format_names, list_one_level};
pub use report::{ReportCopy, ReportCopyBuilder};
pub use spec::{
    EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy, EnumCopyPatternMode,
    EnumCopySymlinkStrategy, FsOpError, SpecCopyOptions, SpecDirectoryEntry,
};
pub use tree::{C_TREE_INDENT_MARKER, build_tree, render_text_tree};
