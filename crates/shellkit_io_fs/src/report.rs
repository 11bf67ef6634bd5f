//! Run report for recursive copy and move.

use std::collections::BTreeMap;
use std::fmt;

/// Counters and warnings from one `copy_tree`, `copy_directory` or `move_directory` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportCopy {
    /// Entries that passed the include/exclude filters.
    pub cnt_matched: u64,
    /// Entries read from source directories.
    pub cnt_scanned: u64,
    /// Directories created plus files and links written.
    pub cnt_copied: u64,
    /// Entries left alone by a conflict or symlink rule.
    pub cnt_skipped: u64,
    /// File content bytes written.
    pub cnt_bytes: u64,
    pub warnings: Vec<String>,
}

impl ReportCopy {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Nothing was written and nothing went wrong.
    pub fn is_noop(&self) -> bool {
        self.cnt_copied == 0 && self.warnings.is_empty()
    }

    /// Counter name to value, for callers that serialize reports.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        BTreeMap::from([
            ("cnt_matched".to_string(), self.cnt_matched),
            ("cnt_scanned".to_string(), self.cnt_scanned),
            ("cnt_copied".to_string(), self.cnt_copied),
            ("cnt_skipped".to_string(), self.cnt_skipped),
            ("cnt_bytes".to_string(), self.cnt_bytes),
            ("cnt_warnings".to_string(), self.warning_count() as u64),
        ])
    }

    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} matched={} copied={} skipped={} bytes={} warnings={}",
            self.cnt_scanned,
            self.cnt_matched,
            self.cnt_copied,
            self.cnt_skipped,
            self.cnt_bytes,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format("[COPY]"))
    }
}

/// Accumulator threaded through the recursive walk; [`ReportCopyBuilder::build`] freezes it.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    report_copy: ReportCopy,
}

impl ReportCopyBuilder {
    pub fn add_scanned(&mut self) {
        self.report_copy.cnt_scanned += 1;
    }

    pub fn add_matched(&mut self) {
        self.report_copy.cnt_matched += 1;
    }

    pub fn add_skipped(&mut self) {
        self.report_copy.cnt_skipped += 1;
    }

    /// One directory created or one link written.
    pub fn add_copied(&mut self) {
        self.report_copy.cnt_copied += 1;
    }

    /// One file written with `n_bytes` of content.
    pub fn add_copied_file(&mut self, n_bytes: u64) {
        self.report_copy.cnt_copied += 1;
        self.report_copy.cnt_bytes += n_bytes;
    }

    /// Record a non-fatal problem; it is also logged at warn level.
    pub fn add_warning(&mut self, warning: String) {
        log::warn!("{warning}");
        self.report_copy.warnings.push(warning);
    }

    pub fn build(self) -> ReportCopy {
        self.report_copy
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportCopy, ReportCopyBuilder};

    #[test]
    fn format_lists_every_counter() {
        let report = ReportCopy {
            cnt_matched: 5,
            cnt_scanned: 8,
            cnt_copied: 3,
            cnt_skipped: 2,
            cnt_bytes: 42,
            warnings: vec!["w".to_string()],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts.len(), 6);
        assert_eq!(dict_counts["cnt_bytes"], 42);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[MOVE]");
        assert_eq!(
            txt,
            "[MOVE] scanned=8 matched=5 copied=3 skipped=2 bytes=42 warnings=1"
        );
        assert!(report.to_string().starts_with("[COPY] scanned=8"));
    }

    #[test]
    fn builder_tracks_files_and_bytes() {
        let mut builder = ReportCopyBuilder::default();
        assert!(builder.clone().build().is_noop());

        builder.add_scanned();
        builder.add_scanned();
        builder.add_matched();
        builder.add_copied();
        builder.add_copied_file(10);
        builder.add_copied_file(5);
        builder.add_skipped();
        builder.add_warning("xattr skipped".to_string());

        let report = builder.build();
        assert_eq!(report.cnt_scanned, 2);
        assert_eq!(report.cnt_copied, 3);
        assert_eq!(report.cnt_bytes, 15);
        assert_eq!(report.warnings, vec!["xattr skipped".to_string()]);
        assert!(!report.is_noop());
    }
}
