use std::collections::BTreeSet;
use std::path::Path;

use shellkit_io_fs::{
    C_TREE_INDENT_MARKER, FsOpError, SpecCopyOptions, SpecDirectoryEntry, WorkingContext,
    build_tree, copy_directory, copy_tree, list_directory_contents, list_one_level,
    move_directory, rename_directory, render_text_tree,
};
use tempfile::TempDir;

fn write_text(path: &Path, txt: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, txt).expect("write text");
}

fn sample_project(root: &Path) {
    write_text(&root.join("README.md"), "readme");
    write_text(&root.join("src/main.rs"), "fn main() {}");
    write_text(&root.join("src/util/mod.rs"), "");
    write_text(&root.join("docs/guide/intro.txt"), "0123456789");
    std::fs::create_dir_all(root.join("docs/empty")).expect("mkdir empty");
}

/// Name, directory flag and file size for every node, keyed by relative path.
fn shape(entry: &SpecDirectoryEntry, prefix: &str, out: &mut BTreeSet<(String, bool, u64)>) {
    for child in entry.children.iter().flatten() {
        let path_rel = format!("{prefix}/{}", child.name);
        let n_size = if child.is_directory { 0 } else { child.size_bytes };
        out.insert((path_rel.clone(), child.is_directory, n_size));
        shape(child, &path_rel, out);
    }
}

fn walk_count(path: &Path) -> (usize, usize) {
    let mut n_entries = 0;
    let mut n_files = 0;
    for entry in std::fs::read_dir(path).expect("read dir") {
        let path_entry = entry.expect("entry").path();
        n_entries += 1;
        if path_entry.is_dir() {
            let (n_sub_entries, n_sub_files) = walk_count(&path_entry);
            n_entries += n_sub_entries;
            n_files += n_sub_files;
        } else {
            n_files += 1;
        }
    }
    (n_entries, n_files)
}

#[test]
fn copy_tree_reproduces_source_shape() {
    let tmp = TempDir::new().expect("tempdir");
    let ctx = WorkingContext::new(tmp.path()).expect("context");
    sample_project(&tmp.path().join("proj"));

    copy_tree(&ctx, "proj", "backup", SpecCopyOptions::default()).expect("copy tree");

    let mut set_src = BTreeSet::new();
    shape(&build_tree(&ctx, "proj").expect("src tree"), "", &mut set_src);
    let mut set_dst = BTreeSet::new();
    shape(&build_tree(&ctx, "backup/proj").expect("dst tree"), "", &mut set_dst);
    assert_eq!(set_src, set_dst);
    assert!(set_src.contains(&("/docs/empty".to_string(), true, 0)));
}

#[test]
fn copy_tree_nests_under_destination() {
    let tmp = TempDir::new().expect("tempdir");
    let path_work = tmp.path().join("work");
    write_text(&path_work.join("a/b/file.txt"), "0123456789");
    std::fs::create_dir_all(path_work.join("c")).expect("mkdir c");
    let ctx = WorkingContext::new(&path_work).expect("context");

    copy_tree(
        &ctx,
        path_work.join("a"),
        path_work.join("c"),
        SpecCopyOptions::default(),
    )
    .expect("copy tree");

    let raw_copy = std::fs::read(path_work.join("c/a/b/file.txt")).expect("read copy");
    assert_eq!(raw_copy, b"0123456789");
    let raw_orig = std::fs::read(path_work.join("a/b/file.txt")).expect("read source");
    assert_eq!(raw_orig, b"0123456789");
}

#[test]
fn copy_directory_of_empty_source_creates_empty_destination() {
    let tmp = TempDir::new().expect("tempdir");
    let ctx = WorkingContext::new(tmp.path()).expect("context");
    std::fs::create_dir_all(tmp.path().join("empty")).expect("mkdir");

    let report = copy_directory(&ctx, "empty", "fresh", SpecCopyOptions::default()).expect("copy");
    assert!(tmp.path().join("fresh").is_dir());
    assert_eq!(std::fs::read_dir(tmp.path().join("fresh")).expect("read").count(), 0);
    assert_eq!(report.cnt_scanned, 0);
}

#[test]
fn tree_counts_match_a_manual_walk() {
    let tmp = TempDir::new().expect("tempdir");
    let ctx = WorkingContext::new(tmp.path()).expect("context");
    sample_project(&tmp.path().join("proj"));
    let (n_entries, n_files) = walk_count(&tmp.path().join("proj"));

    let txt_tree = render_text_tree(&ctx, "proj").expect("text tree");
    assert_eq!(txt_tree.lines().count(), n_entries);
    assert!(txt_tree.lines().any(|line| line == format!("{C_TREE_INDENT_MARKER}main.rs")));

    let entry_root = build_tree(&ctx, "proj").expect("tree");
    let n_immediate = list_directory_contents(&ctx, "proj").expect("ls").len();
    assert_eq!(entry_root.children.as_ref().map(Vec::len), Some(n_immediate));
    assert_eq!(entry_root.count_files(), n_files);
    assert_eq!(entry_root.count_descendants(), n_entries);
}

#[test]
fn relative_paths_follow_the_working_directory() {
    let tmp = TempDir::new().expect("tempdir");
    sample_project(&tmp.path().join("proj"));
    let mut ctx = WorkingContext::new(tmp.path()).expect("context");

    ctx.change_directory("proj/docs").expect("cd");
    let txt_tree = render_text_tree(&ctx, ".").expect("tree");
    assert!(txt_tree.lines().any(|line| line == "guide"));
    let txt_tree = render_text_tree(&ctx, "../src").expect("tree via parent");
    assert!(txt_tree.lines().any(|line| line == "main.rs"));

    let err = ctx.change_directory("guide/intro.txt").expect_err("file");
    assert!(matches!(err, FsOpError::NotADirectory(_)));
    assert!(ctx.show_work_directory().ends_with("proj/docs"));
}

#[test]
fn rename_then_move_keep_content() {
    let tmp = TempDir::new().expect("tempdir");
    let ctx = WorkingContext::new(tmp.path()).expect("context");
    write_text(&tmp.path().join("w/old/data.txt"), "payload");
    std::fs::create_dir_all(tmp.path().join("archive")).expect("mkdir");

    rename_directory(&ctx, "w/old", "w/new").expect("rename");
    assert!(!tmp.path().join("w/old").exists());

    let err = rename_directory(&ctx, "w/new", "archive/new").expect_err("cross parent");
    assert!(matches!(err, FsOpError::SamePathRenameRequired { .. }));

    move_directory(&ctx, "w/new", "archive").expect("move");
    assert!(!tmp.path().join("w/new").exists());
    let txt = std::fs::read_to_string(tmp.path().join("archive/new/data.txt")).expect("read");
    assert_eq!(txt, "payload");
}

#[cfg(unix)]
#[test]
fn move_directory_reports_failed_cleanup() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().expect("tempdir");
    let ctx = WorkingContext::new(tmp.path()).expect("context");
    write_text(&tmp.path().join("parent/proj/inner/data.txt"), "payload");
    std::fs::create_dir_all(tmp.path().join("dest")).expect("mkdir");

    let path_locked = tmp.path().join("parent/proj/inner");
    std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o555))
        .expect("lock");
    // Privileged runs ignore permission bits.
    let path_canary = path_locked.join("canary");
    if std::fs::write(&path_canary, "x").is_ok() {
        std::fs::remove_file(&path_canary).expect("remove canary");
        std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o755))
            .expect("unlock");
        return;
    }

    let res = move_directory(&ctx, "parent/proj", "dest");
    std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o755))
        .expect("unlock");

    let err = res.expect_err("cleanup must fail");
    assert!(matches!(err, FsOpError::CleanupFailedAfterCopy { .. }));
    assert!(tmp.path().join("parent/proj/inner/data.txt").is_file());
    assert!(tmp.path().join("dest/proj/inner/data.txt").is_file());
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_fails_listing_tree_and_copy() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().expect("tempdir");
    let ctx = WorkingContext::new(tmp.path()).expect("context");
    write_text(&tmp.path().join("src/top.txt"), "top");
    write_text(&tmp.path().join("src/locked/hidden.txt"), "hidden");

    let path_locked = tmp.path().join("src/locked");
    std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o000))
        .expect("lock");
    // Privileged runs ignore permission bits.
    if std::fs::read_dir(&path_locked).is_ok() {
        std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o755))
            .expect("unlock");
        return;
    }

    let res_list = list_one_level(&ctx, "src/locked");
    let res_tree = render_text_tree(&ctx, "src");
    let res_copy = copy_tree(&ctx, "src", "dst", SpecCopyOptions::default());
    std::fs::set_permissions(&path_locked, std::fs::Permissions::from_mode(0o755))
        .expect("unlock");

    for err in [
        res_list.expect_err("list locked"),
        res_tree.expect_err("tree over locked"),
        res_copy.expect_err("copy over locked"),
    ] {
        assert!(matches!(err, FsOpError::ReadFailure { .. }), "{err}");
        assert!(err.path().expect("failing path").ends_with("src/locked"));
    }
    assert!(!tmp.path().join("dst/src/locked/hidden.txt").exists());
}
