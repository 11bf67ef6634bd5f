use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use filetime::FileTime;
use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::report::ReportCopyBuilder;
use crate::spec::{EnumCopyPatternMode, FsOpError, SpecCopyOptions};

/// Display layout of [`crate::SpecDirectoryEntry::modified_at`].
pub(crate) const C_MODIFIED_AT_FORMAT: &str = "%b %d %Y %H:%M:%S";

////////////////////////////////////////////////////////////////////////////////
// #region NameFilter

/// One compiled include/exclude pattern, tested against an entry base name.
#[derive(Debug, Clone)]
enum EnumNameMatcher {
    Substring(String),
    Glob(GlobMatcher),
    Regex(Regex),
}

impl EnumNameMatcher {
    fn compile(raw: &str, rule_pattern: EnumCopyPatternMode) -> Result<Self, FsOpError> {
        let invalid = |detail: String| {
            FsOpError::InvalidPattern(format!(
                "Invalid pattern `{raw}` in include/exclude: {detail}"
            ))
        };
        match rule_pattern {
            EnumCopyPatternMode::Literal => Ok(Self::Substring(raw.to_string())),
            EnumCopyPatternMode::Glob => Glob::new(raw)
                .map(|glob| Self::Glob(glob.compile_matcher()))
                .map_err(|e| invalid(e.to_string())),
            EnumCopyPatternMode::Regex => Regex::new(raw)
                .map(Self::Regex)
                .map_err(|e| invalid(e.to_string())),
        }
    }

    fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Substring(needle) => name.contains(needle.as_str()),
            Self::Glob(matcher) => matcher.is_match(name),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

/// Include/exclude lists for one entry kind.
///
/// An empty include list admits every name; exclusion always wins.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecNameFilter {
    l_include: Vec<EnumNameMatcher>,
    l_exclude: Vec<EnumNameMatcher>,
}

impl SpecNameFilter {
    fn compile(
        include: Option<&[String]>,
        exclude: Option<&[String]>,
        rule_pattern: EnumCopyPatternMode,
    ) -> Result<Self, FsOpError> {
        let compile_all = |l_raw: Option<&[String]>| {
            l_raw
                .unwrap_or_default()
                .iter()
                .map(|raw| EnumNameMatcher::compile(raw, rule_pattern))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            l_include: compile_all(include)?,
            l_exclude: compile_all(exclude)?,
        })
    }

    pub(crate) fn admits(&self, name: &str) -> bool {
        let b_included =
            self.l_include.is_empty() || self.l_include.iter().any(|m| m.is_match(name));
        b_included && !self.l_exclude.iter().any(|m| m.is_match(name))
    }
}

/// Compiled filters for files and for directories of one copy run.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecCopyFilters {
    pub(crate) filter_files: SpecNameFilter,
    pub(crate) filter_dirs: SpecNameFilter,
}

impl SpecCopyFilters {
    /// Compile every pattern up front so a bad one fails before any write.
    pub(crate) fn from_options(spec_cp_options: &SpecCopyOptions) -> Result<Self, FsOpError> {
        Ok(Self {
            filter_files: SpecNameFilter::compile(
                spec_cp_options.patterns_include_files.as_deref(),
                spec_cp_options.patterns_exclude_files.as_deref(),
                spec_cp_options.rule_pattern,
            )?,
            filter_dirs: SpecNameFilter::compile(
                spec_cp_options.patterns_include_dirs.as_deref(),
                spec_cp_options.patterns_exclude_dirs.as_deref(),
                spec_cp_options.rule_pattern,
            )?,
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Last path component as text, or the whole path when it has none (`/`).
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Both resolved paths live directly inside the same directory.
///
/// Trailing separators are ignored.
pub(crate) fn is_same_parent(path_old: &Path, path_new: &Path) -> bool {
    path_old.parent() == path_new.parent()
}

/// `dst` lies inside `src` or the other way round.
pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = canonicalize_existing_prefix(src);
    let dst_resolved = canonicalize_existing_prefix(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

/// Canonicalize the longest existing ancestor and re-append the missing tail.
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut path_cursor = path.to_path_buf();
    let mut l_tail = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(&path_cursor) {
            return l_tail.into_iter().rev().fold(resolved, |acc, part| acc.join(part));
        }
        match (path_cursor.file_name(), path_cursor.parent()) {
            (Some(name), Some(parent)) => {
                l_tail.push(name.to_os_string());
                path_cursor = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EntryRendering

/// `ls -l` style mode string. Links render with a leading `L`.
pub(crate) fn format_permission_string(meta: &fs::Metadata) -> String {
    let file_type = meta.file_type();
    let c_kind = if file_type.is_symlink() {
        'L'
    } else if file_type.is_dir() {
        'd'
    } else {
        '-'
    };

    #[cfg(unix)]
    let n_mode = {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode()
    };
    #[cfg(not(unix))]
    let n_mode: u32 = if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    };

    let l_bits = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    std::iter::once(c_kind)
        .chain(
            l_bits
                .iter()
                .map(|(n_bit, c)| if n_mode & n_bit != 0 { *c } else { '-' }),
        )
        .collect()
}

/// Local modification time as `Mon DD YYYY HH:MM:SS`.
pub(crate) fn format_modified_at(meta: &fs::Metadata) -> String {
    let file_time = FileTime::from_last_modification_time(meta);
    let time_local: DateTime<Local> = Local
        .timestamp_opt(file_time.unix_seconds(), file_time.nanoseconds())
        .earliest()
        .unwrap_or_else(|| DateTime::<Local>::from(DateTime::UNIX_EPOCH));
    time_local.format(C_MODIFIED_AT_FORMAT).to_string()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Whole-file buffered copy: read everything, then create and write.
///
/// `if_create_new` makes an existing destination fail with `AlreadyExists`.
/// A failure during the write leaves a partial destination file behind.
pub(crate) fn copy_file_contents(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_create_new: bool,
) -> Result<u64, FsOpError> {
    let raw_content =
        fs::read(path_file_src).map_err(|e| FsOpError::from_read(path_file_src, e))?;

    let mut open_options = fs::OpenOptions::new();
    open_options.write(true);
    if if_create_new {
        open_options.create_new(true);
    } else {
        open_options.create(true).truncate(true);
    }
    let mut file_dst = open_options.open(path_file_dst).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            FsOpError::AlreadyExists(path_file_dst.to_path_buf())
        } else {
            FsOpError::from_write(path_file_dst, e)
        }
    })?;
    file_dst
        .write_all(&raw_content)
        .and_then(|_| file_dst.flush())
        .map_err(|e| FsOpError::from_write(path_file_dst, e))?;
    Ok(raw_content.len() as u64)
}

/// Copy permissions, timestamps and (on Linux) extended attributes.
///
/// Attribute failures are recorded as warnings; permission and time failures abort.
pub(crate) fn apply_file_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), FsOpError> {
    use filetime::set_file_times;

    let stat_src =
        fs::metadata(path_file_src).map_err(|e| FsOpError::from_read(path_file_src, e))?;
    fs::set_permissions(path_file_dst, stat_src.permissions())
        .map_err(|e| FsOpError::from_write(path_file_dst, e))?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)
        .map_err(|e| FsOpError::from_write(path_file_dst, e))?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst, builder_cp_report);
    #[cfg(not(target_os = "linux"))]
    let _ = builder_cp_report;
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(
    path_file_src: &Path,
    path_file_dst: &Path,
    builder_cp_report: &mut ReportCopyBuilder,
) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            builder_cp_report.add_warning(format!(
                "Failed to copy extended attribute {} to {} ({e})",
                name.to_string_lossy(),
                path_file_dst.display()
            ));
        }
    }
}

/// Recreate the link stored at `path_src` as `path_dst`.
pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), FsOpError> {
    let target = fs::read_link(path_src).map_err(|e| FsOpError::from_read(path_src, e))?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
            .map_err(|e| FsOpError::from_write(path_dst, e))
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        let res = if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        };
        res.map_err(|e| FsOpError::from_write(path_dst, e))
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(FsOpError::WriteFailure {
            path: path_dst.to_path_buf(),
            message: "Symbolic links are unsupported on this platform".to_string(),
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn patterns(l_raw: &[&str]) -> Vec<String> {
        l_raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn glob_include_and_exclude_compose() {
        let spec_cp_options = SpecCopyOptions {
            patterns_include_files: Some(patterns(&["*.txt"])),
            patterns_exclude_files: Some(patterns(&["skip_*"])),
            ..SpecCopyOptions::default()
        };
        let spec_cp_filters = SpecCopyFilters::from_options(&spec_cp_options).expect("compile");

        assert!(spec_cp_filters.filter_files.admits("a.txt"));
        assert!(!spec_cp_filters.filter_files.admits("a.md"));
        assert!(!spec_cp_filters.filter_files.admits("skip_a.txt"));
        assert!(spec_cp_filters.filter_dirs.admits("anything"));
    }

    #[test]
    fn literal_and_regex_modes() {
        let spec_cp_options = SpecCopyOptions {
            patterns_exclude_dirs: Some(patterns(&["cache"])),
            rule_pattern: EnumCopyPatternMode::Literal,
            ..SpecCopyOptions::default()
        };
        let spec_cp_filters = SpecCopyFilters::from_options(&spec_cp_options).expect("compile");
        assert!(!spec_cp_filters.filter_dirs.admits("__cache__"));
        assert!(spec_cp_filters.filter_dirs.admits("src"));

        let spec_cp_options = SpecCopyOptions {
            patterns_include_files: Some(patterns(&[r"^report_\d+\.csv$"])),
            rule_pattern: EnumCopyPatternMode::Regex,
            ..SpecCopyOptions::default()
        };
        let spec_cp_filters = SpecCopyFilters::from_options(&spec_cp_options).expect("compile");
        assert!(spec_cp_filters.filter_files.admits("report_01.csv"));
        assert!(!spec_cp_filters.filter_files.admits("report_x.csv"));
    }

    #[test]
    fn empty_pattern_lists_admit_everything() {
        let spec_cp_options = SpecCopyOptions {
            patterns_include_files: Some(Vec::new()),
            patterns_exclude_dirs: Some(Vec::new()),
            ..SpecCopyOptions::default()
        };
        let spec_cp_filters = SpecCopyFilters::from_options(&spec_cp_options).expect("compile");
        assert!(spec_cp_filters.filter_files.admits("any.bin"));
        assert!(spec_cp_filters.filter_dirs.admits("target"));
    }

    #[test]
    fn invalid_patterns_rejected() {
        let spec_cp_options = SpecCopyOptions {
            patterns_include_files: Some(patterns(&["("])),
            rule_pattern: EnumCopyPatternMode::Regex,
            ..SpecCopyOptions::default()
        };
        let err = SpecCopyFilters::from_options(&spec_cp_options).expect_err("invalid regex");
        assert!(matches!(err, FsOpError::InvalidPattern(ref msg) if msg.contains("`(`")));

        let spec_cp_options = SpecCopyOptions {
            patterns_exclude_dirs: Some(patterns(&["["])),
            ..SpecCopyOptions::default()
        };
        let err = SpecCopyFilters::from_options(&spec_cp_options).expect_err("invalid glob");
        assert!(matches!(err, FsOpError::InvalidPattern(_)));
    }

    #[cfg(unix)]
    #[test]
    fn same_parent_ignores_trailing_separator() {
        assert!(is_same_parent(Path::new("/w/a/"), Path::new("/w/b")));
        assert!(!is_same_parent(Path::new("/w/a"), Path::new("/w/c/b")));
        assert_eq!(base_name(Path::new("/w/a/")), "a");
        assert_eq!(base_name(Path::new("/")), "/");
    }

    #[test]
    fn overlap_detects_nested_destination() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).expect("mkdir");

        assert!(is_overlap(&src, &src.join("nested/deeper")));
        assert!(is_overlap(&src.join("x"), &src));
        assert!(!is_overlap(&src, &tmp.path().join("dst")));
    }

    #[cfg(unix)]
    #[test]
    fn permission_string_renders_mode_bits() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        fs::write(&path_file, "x").expect("write");
        fs::set_permissions(&path_file, fs::Permissions::from_mode(0o640)).expect("chmod");
        let path_dir = tmp.path().join("d");
        fs::create_dir(&path_dir).expect("mkdir");
        fs::set_permissions(&path_dir, fs::Permissions::from_mode(0o755)).expect("chmod");

        let meta_file = fs::metadata(&path_file).expect("stat");
        assert_eq!(format_permission_string(&meta_file), "-rw-r-----");
        let meta_dir = fs::metadata(&path_dir).expect("stat");
        assert_eq!(format_permission_string(&meta_dir), "drwxr-xr-x");
    }

    #[test]
    fn modified_at_uses_fixed_layout() {
        use filetime::set_file_mtime;

        let tmp = TempDir::new().expect("tempdir");
        let path_file = tmp.path().join("f.txt");
        fs::write(&path_file, "x").expect("write");
        set_file_mtime(&path_file, FileTime::from_unix_time(1_700_000_000, 0)).expect("mtime");

        let meta_file = fs::metadata(&path_file).expect("stat");
        let expected = Local
            .timestamp_opt(1_700_000_000, 0)
            .earliest()
            .expect("local time")
            .format("%b %d %Y %H:%M:%S")
            .to_string();
        let rendered = format_modified_at(&meta_file);
        assert_eq!(rendered, expected);
        assert!(rendered.contains(" 2023 "));
    }

    #[test]
    fn copy_file_contents_create_new_refuses_existing() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("a.txt");
        let dst = tmp.path().join("b.txt");
        fs::write(&src, "0123456789").expect("write");

        assert_eq!(copy_file_contents(&src, &dst, true).expect("copy"), 10);
        assert_eq!(fs::read(&dst).expect("read"), b"0123456789");

        let err = copy_file_contents(&src, &dst, true).expect_err("exists");
        assert!(matches!(err, FsOpError::AlreadyExists(_)));

        fs::write(&src, "new").expect("write");
        copy_file_contents(&src, &dst, false).expect("overwrite");
        assert_eq!(fs::read_to_string(&dst).expect("read"), "new");

        let err =
            copy_file_contents(&tmp.path().join("missing"), &dst, false).expect_err("missing");
        assert!(matches!(err, FsOpError::NotFound(_)));
    }
}
