/// The accumulated result of one scan.
///
/// A `ScanReport` is owned by the scan call and handed back when the walk
/// finishes. Nothing about it is global: two scans in the same process
/// produce two independent reports.
use super::format::DocumentFormat;
use serde::Serialize;
use std::path::PathBuf;

/// One password-protected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// The scan root the file was discovered under (absolute).
    pub root: PathBuf,
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path shown to the user: relative to `root` where possible.
    pub display: String,
    pub format: DocumentFormat,
}

/// Counters and findings for a completed (or cancelled) scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Protected files in walk order.
    pub findings: Vec<Finding>,
    /// Supported files that were classified and either checked or skipped.
    pub files_examined: u64,
    /// Detector failures (I/O, corrupt archives, tool failures).
    pub detection_errors: u64,
    /// Roots that could not be resolved plus entries the walk could not read.
    pub walk_errors: u64,
    /// Office files left unchecked because the Office tool is unavailable.
    pub office_skipped: u64,
    /// Set the first time an Office file is skipped; never cleared.
    pub office_tool_missing: bool,
    /// `true` if the scan stopped early on request.
    pub cancelled: bool,
    pub started_at: chrono::DateTime<chrono::Local>,
    pub duration_ms: u64,
}

impl Default for ScanReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanReport {
    pub fn new() -> Self {
        Self {
            findings: Vec::new(),
            files_examined: 0,
            detection_errors: 0,
            walk_errors: 0,
            office_skipped: 0,
            office_tool_missing: false,
            cancelled: false,
            started_at: chrono::Local::now(),
            duration_ms: 0,
        }
    }

    /// Number of protected files found.
    #[inline]
    pub fn protected_count(&self) -> usize {
        self.findings.len()
    }

    /// Record an Office file that could not be checked.
    ///
    /// Idempotent with respect to the warning flag: only the counter grows.
    pub fn record_office_skipped(&mut self) {
        self.office_skipped += 1;
        self.office_tool_missing = true;
    }

    /// Display paths in report order, as printed by the text renderer.
    pub fn display_paths(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.display.as_str()).collect()
    }
}
