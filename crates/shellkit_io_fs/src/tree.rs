//! Recursive tree rendering and materialization.
//!
//! Both walks visit entries in listing order and stop at the first error.

use std::fs;
use std::path::Path;

use crate::context::WorkingContext;
use crate::list::{describe_entry, read_directory_entries};
use crate::spec::{FsOpError, SpecDirectoryEntry};
use crate::util::base_name;

/// Indent marker repeated `depth - 1` times in front of each name.
pub const C_TREE_INDENT_MARKER: &str = "----";

/// `tree`: one line per entry, children inlined right below their directory.
pub fn render_text_tree<P: AsRef<Path>>(
    ctx: &WorkingContext,
    path: P,
) -> Result<String, FsOpError> {
    let path_root = ctx.complete_path(path);
    ensure_directory(&path_root)?;

    let mut txt_tree = String::new();
    render_level(&path_root, 1, &mut txt_tree)?;
    Ok(txt_tree)
}

fn render_level(path_dir: &Path, n_depth: usize, txt_tree: &mut String) -> Result<(), FsOpError> {
    for entry in read_directory_entries(path_dir)? {
        txt_tree.push_str(&C_TREE_INDENT_MARKER.repeat(n_depth - 1));
        txt_tree.push_str(&entry.name);
        txt_tree.push('\n');
        if entry.is_directory {
            render_level(&path_dir.join(&entry.name), n_depth + 1, txt_tree)?;
        }
    }
    Ok(())
}

/// Materialize the subtree under `path` with `children` attached to every directory.
pub fn build_tree<P: AsRef<Path>>(
    ctx: &WorkingContext,
    path: P,
) -> Result<SpecDirectoryEntry, FsOpError> {
    let path_root = ctx.complete_path(path);
    let meta_root = ensure_directory(&path_root)?;

    let mut entry_root = describe_entry(base_name(&path_root), &meta_root);
    entry_root.children = Some(build_children(&path_root)?);
    Ok(entry_root)
}

fn build_children(path_dir: &Path) -> Result<Vec<SpecDirectoryEntry>, FsOpError> {
    let mut l_children = read_directory_entries(path_dir)?;
    for entry in l_children.iter_mut().filter(|entry| entry.is_directory) {
        entry.children = Some(build_children(&path_dir.join(&entry.name))?);
    }
    Ok(l_children)
}

fn ensure_directory(path: &Path) -> Result<fs::Metadata, FsOpError> {
    let meta = fs::metadata(path).map_err(|e| FsOpError::from_read(path, e))?;
    if !meta.is_dir() {
        return Err(FsOpError::NotADirectory(path.to_path_buf()));
    }
    Ok(meta)
}
