use std::collections::BTreeMap;
use std::path::PathBuf;

use pyo3::exceptions::{
    PyFileExistsError, PyFileNotFoundError, PyIsADirectoryError, PyNotADirectoryError, PyOSError,
    PyValueError,
};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use shellkit_io_fs::{
    EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy, EnumCopyPatternMode,
    EnumCopySymlinkStrategy, FsOpError, ReportCopy, SpecCopyOptions, SpecDirectoryEntry,
    WorkingContext,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "shellkit.fs.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "DirectoryEntry")]
#[derive(Debug, Clone)]
struct PyDirectoryEntry {
    #[pyo3(get)]
    name: String,
    #[pyo3(get)]
    is_directory: bool,
    #[pyo3(get)]
    is_symlink: bool,
    #[pyo3(get)]
    permission_string: String,
    #[pyo3(get)]
    modified_at: String,
    #[pyo3(get)]
    size_bytes: u64,
    #[pyo3(get)]
    children: Option<Vec<PyDirectoryEntry>>,
}

impl From<SpecDirectoryEntry> for PyDirectoryEntry {
    fn from(entry: SpecDirectoryEntry) -> Self {
        Self {
            name: entry.name,
            is_directory: entry.is_directory,
            is_symlink: entry.is_symlink,
            permission_string: entry.permission_string,
            modified_at: entry.modified_at,
            size_bytes: entry.size_bytes,
            children: entry
                .children
                .map(|children| children.into_iter().map(PyDirectoryEntry::from).collect()),
        }
    }
}

#[pymethods]
impl PyDirectoryEntry {
    fn __repr__(&self) -> String {
        format!(
            "DirectoryEntry(name={:?}, is_directory={}, size_bytes={})",
            self.name,
            if self.is_directory { "True" } else { "False" },
            self.size_bytes
        )
    }
}

#[pyclass(name = "ReportCopy")]
#[derive(Debug, Clone)]
struct PyReportCopy {
    #[pyo3(get)]
    cnt_matched: u64,
    #[pyo3(get)]
    cnt_scanned: u64,
    #[pyo3(get)]
    cnt_copied: u64,
    #[pyo3(get)]
    cnt_skipped: u64,
    #[pyo3(get)]
    cnt_bytes: u64,
    #[pyo3(get)]
    warnings: Vec<String>,
    report_copy: ReportCopy,
}

impl From<ReportCopy> for PyReportCopy {
    fn from(report_copy: ReportCopy) -> Self {
        Self {
            cnt_matched: report_copy.cnt_matched,
            cnt_scanned: report_copy.cnt_scanned,
            cnt_copied: report_copy.cnt_copied,
            cnt_skipped: report_copy.cnt_skipped,
            cnt_bytes: report_copy.cnt_bytes,
            warnings: report_copy.warnings.clone(),
            report_copy,
        }
    }
}

#[pymethods]
impl PyReportCopy {
    #[getter]
    fn warning_count(&self) -> usize {
        self.report_copy.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report_copy.to_dict()
    }

    #[pyo3(signature = (prefix = "[COPY]"))]
    fn format(&self, prefix: &str) -> String {
        self.report_copy.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report_copy.to_string()
    }
}

fn parse_rule_pattern(value: &str) -> PyResult<EnumCopyPatternMode> {
    match value {
        "glob" => Ok(EnumCopyPatternMode::Glob),
        "regex" => Ok(EnumCopyPatternMode::Regex),
        "literal" => Ok(EnumCopyPatternMode::Literal),
        _ => Err(PyValueError::new_err(format!(
            "Invalid pattern strategy: `{value}`. Expected one of: ['glob', 'regex', 'literal']"
        ))),
    }
}

fn parse_rule_conflict_file(value: &str) -> PyResult<EnumCopyFileConflictStrategy> {
    match value {
        "skip" => Ok(EnumCopyFileConflictStrategy::Skip),
        "overwrite" => Ok(EnumCopyFileConflictStrategy::Overwrite),
        "error" => Ok(EnumCopyFileConflictStrategy::Error),
        _ => Err(PyValueError::new_err(format!(
            "Invalid file conflict strategy: `{value}`. Expected one of: ['skip', 'overwrite', 'error']"
        ))),
    }
}

fn parse_rule_conflict_dir(value: &str) -> PyResult<EnumCopyDirectoryConflictStrategy> {
    match value {
        "skip" => Ok(EnumCopyDirectoryConflictStrategy::Skip),
        "merge" => Ok(EnumCopyDirectoryConflictStrategy::Merge),
        "error" => Ok(EnumCopyDirectoryConflictStrategy::Error),
        _ => Err(PyValueError::new_err(format!(
            "Invalid directory conflict strategy: `{value}`. Expected one of: ['skip', 'merge', 'error']"
        ))),
    }
}

fn parse_rule_symlink(value: &str) -> PyResult<EnumCopySymlinkStrategy> {
    match value {
        "dereference" => Ok(EnumCopySymlinkStrategy::Dereference),
        "copy_symlinks" => Ok(EnumCopySymlinkStrategy::CopySymlinks),
        "skip_symlinks" => Ok(EnumCopySymlinkStrategy::SkipSymlinks),
        _ => Err(PyValueError::new_err(format!(
            "Invalid symlink strategy: `{value}`. Expected one of: ['dereference', 'copy_symlinks', 'skip_symlinks']"
        ))),
    }
}

fn map_fs_op_error(exception: FsOpError) -> PyErr {
    let message = exception.to_string();
    match exception {
        FsOpError::NotFound(_) => PyFileNotFoundError::new_err(message),
        FsOpError::NotADirectory(_) => PyNotADirectoryError::new_err(message),
        FsOpError::NotAFile(_) => PyIsADirectoryError::new_err(message),
        FsOpError::AlreadyExists(_) => PyFileExistsError::new_err(message),
        FsOpError::SamePathRenameRequired { .. }
        | FsOpError::DifferentPathMoveRequired { .. }
        | FsOpError::SourceDestinationOverlap { .. }
        | FsOpError::UnsafeDestination(_)
        | FsOpError::InvalidPattern(_) => PyValueError::new_err(message),
        FsOpError::ReadFailure { .. }
        | FsOpError::WriteFailure { .. }
        | FsOpError::CleanupFailedAfterCopy { .. } => PyOSError::new_err(message),
    }
}

/// Python-side shell session: one working directory, shell-named methods.
#[pyclass(name = "FsContext")]
#[derive(Debug, Clone)]
struct PyFsContext {
    ctx: WorkingContext,
}

#[pymethods]
impl PyFsContext {
    #[new]
    #[pyo3(signature = (dir_work = None))]
    fn new(dir_work: Option<PathBuf>) -> PyResult<Self> {
        let ctx = match dir_work {
            Some(path_dir_work) => {
                let mut ctx = WorkingContext::from_process().map_err(map_fs_op_error)?;
                ctx.change_directory(path_dir_work).map_err(map_fs_op_error)?;
                ctx
            }
            None => WorkingContext::from_process().map_err(map_fs_op_error)?,
        };
        Ok(Self { ctx })
    }

    fn pwd(&self) -> String {
        self.ctx.show_work_directory().to_string_lossy().to_string()
    }

    fn cd(&mut self, path: PathBuf) -> PyResult<()> {
        self.ctx.change_directory(path).map_err(map_fs_op_error)
    }

    fn mkdir(&self, dirname: PathBuf) -> PyResult<()> {
        shellkit_io_fs::create_directory(&self.ctx, dirname).map_err(map_fs_op_error)
    }

    fn rmdir(&self, dirname: PathBuf) -> PyResult<()> {
        shellkit_io_fs::delete_directory(&self.ctx, dirname).map_err(map_fs_op_error)
    }

    #[pyo3(signature = (dirname = PathBuf::from(".")))]
    fn ls(&self, dirname: PathBuf) -> PyResult<String> {
        shellkit_io_fs::list_directory(&self.ctx, dirname).map_err(map_fs_op_error)
    }

    #[pyo3(signature = (dirname = PathBuf::from(".")))]
    fn lsl(&self, dirname: PathBuf) -> PyResult<String> {
        shellkit_io_fs::list_directory_long(&self.ctx, dirname).map_err(map_fs_op_error)
    }

    #[pyo3(signature = (dirname = PathBuf::from(".")))]
    fn list_contents(&self, dirname: PathBuf) -> PyResult<Vec<PyDirectoryEntry>> {
        let l_entries = shellkit_io_fs::list_directory_contents(&self.ctx, dirname)
            .map_err(map_fs_op_error)?;
        Ok(l_entries.into_iter().map(PyDirectoryEntry::from).collect())
    }

    #[pyo3(signature = (dirname = PathBuf::from(".")))]
    fn tree(&self, py: Python<'_>, dirname: PathBuf) -> PyResult<String> {
        py.allow_threads(|| shellkit_io_fs::tree_directory(&self.ctx, dirname))
            .map_err(map_fs_op_error)
    }

    #[pyo3(signature = (dirname = PathBuf::from(".")))]
    fn tree_contents(&self, py: Python<'_>, dirname: PathBuf) -> PyResult<PyDirectoryEntry> {
        let entry_root = py
            .allow_threads(|| shellkit_io_fs::tree_directory_contents(&self.ctx, dirname))
            .map_err(map_fs_op_error)?;
        Ok(PyDirectoryEntry::from(entry_root))
    }

    /// `cp -r`. With `if_keep_name` the copy lands in `dir_destination/<name>`,
    /// otherwise the contents go straight into `dir_destination`.
    #[pyo3(signature = (
        dir_source,
        dir_destination,
        patterns_include_files = None,
        patterns_exclude_files = None,
        patterns_include_dirs = None,
        patterns_exclude_dirs = None,
        rule_pattern = "glob",
        rule_conflict_file = "error",
        rule_conflict_dir = "merge",
        rule_symlink = "dereference",
        if_preserve_metadata = false,
        if_keep_name = true
    ))]
    #[allow(clippy::too_many_arguments)]
    fn copy_dir(
        &self,
        py: Python<'_>,
        dir_source: PathBuf,
        dir_destination: PathBuf,
        patterns_include_files: Option<Vec<String>>,
        patterns_exclude_files: Option<Vec<String>>,
        patterns_include_dirs: Option<Vec<String>>,
        patterns_exclude_dirs: Option<Vec<String>>,
        rule_pattern: &str,
        rule_conflict_file: &str,
        rule_conflict_dir: &str,
        rule_symlink: &str,
        if_preserve_metadata: bool,
        if_keep_name: bool,
    ) -> PyResult<PyReportCopy> {
        let spec_cp_options = SpecCopyOptions {
            patterns_include_files,
            patterns_exclude_files,
            patterns_include_dirs,
            patterns_exclude_dirs,
            rule_pattern: parse_rule_pattern(rule_pattern)?,
            rule_conflict_file: parse_rule_conflict_file(rule_conflict_file)?,
            rule_conflict_dir: parse_rule_conflict_dir(rule_conflict_dir)?,
            rule_symlink: parse_rule_symlink(rule_symlink)?,
            if_preserve_metadata,
        };

        let report_copy = py.allow_threads(|| {
            if if_keep_name {
                shellkit_io_fs::copy_directory_into(
                    &self.ctx,
                    dir_source,
                    dir_destination,
                    spec_cp_options,
                )
            } else {
                shellkit_io_fs::copy_directory(
                    &self.ctx,
                    dir_source,
                    dir_destination,
                    spec_cp_options,
                )
            }
        });
        let report_copy = report_copy.map_err(map_fs_op_error)?;
        Ok(PyReportCopy::from(report_copy))
    }

    fn rename_dir(&self, old_dirname: PathBuf, new_dirname: PathBuf) -> PyResult<()> {
        shellkit_io_fs::rename_directory(&self.ctx, old_dirname, new_dirname)
            .map_err(map_fs_op_error)
    }

    fn move_dir(
        &self,
        py: Python<'_>,
        old_dirname: PathBuf,
        new_dirname: PathBuf,
    ) -> PyResult<PyReportCopy> {
        let report_copy = py
            .allow_threads(|| shellkit_io_fs::move_directory(&self.ctx, old_dirname, new_dirname))
            .map_err(map_fs_op_error)?;
        Ok(PyReportCopy::from(report_copy))
    }

    #[pyo3(signature = (filename, if_override = false))]
    fn touch(&self, filename: PathBuf, if_override: bool) -> PyResult<()> {
        shellkit_io_fs::create_file(&self.ctx, filename, if_override).map_err(map_fs_op_error)
    }

    fn read_file<'py>(
        &self,
        py: Python<'py>,
        filename: PathBuf,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let raw_content =
            shellkit_io_fs::read_file(&self.ctx, filename).map_err(map_fs_op_error)?;
        Ok(PyBytes::new(py, &raw_content))
    }

    fn write_file(&self, filename: PathBuf, content: &[u8]) -> PyResult<()> {
        shellkit_io_fs::write_file(&self.ctx, filename, content).map_err(map_fs_op_error)
    }

    fn rm(&self, filename: PathBuf) -> PyResult<()> {
        shellkit_io_fs::delete_file(&self.ctx, filename).map_err(map_fs_op_error)
    }

    fn copy_file(&self, old_filename: PathBuf, new_filename: PathBuf) -> PyResult<()> {
        shellkit_io_fs::copy_file(&self.ctx, old_filename, new_filename).map_err(map_fs_op_error)
    }

    fn rename_file(&self, old_filename: PathBuf, new_filename: PathBuf) -> PyResult<()> {
        shellkit_io_fs::rename_file(&self.ctx, old_filename, new_filename)
            .map_err(map_fs_op_error)
    }

    fn move_file(&self, old_filename: PathBuf, new_filename: PathBuf) -> PyResult<()> {
        shellkit_io_fs::move_file(&self.ctx, old_filename, new_filename).map_err(map_fs_op_error)
    }

    fn exists(&self, path: PathBuf) -> bool {
        shellkit_io_fs::exists(&self.ctx, path)
    }

    fn __repr__(&self) -> String {
        format!("FsContext({:?})", self.pwd())
    }
}

#[pymodule]
fn _shellkit_io_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyFsContext>()?;
    module.add_class::<PyDirectoryEntry>()?;
    module.add_class::<PyReportCopy>()?;
    module.add("C_TREE_INDENT_MARKER", shellkit_io_fs::C_TREE_INDENT_MARKER)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
