/// Scanner module: walks scan roots and checks every supported document.
///
/// For each root the walk runs first (serial, sorted), then the supported
/// candidates are checked either one at a time or on a bounded rayon pool.
/// Results are folded into the [`ScanReport`] in walk order either way, so
/// a parallel run prints exactly what a sequential run prints.
///
/// Nothing here is global: the detectors and tool availability arrive in
/// the [`Scanner`], and everything the scan learns leaves in the report.
pub mod progress;
pub mod walk;

use crate::detect::{DetectError, DetectorSet};
use crate::model::{
    DetectionOutcome, DocumentFormat, FileCandidate, Finding, ScanReport, SkipReason,
};
use crate::process::{CancelToken, RunError};
use crossbeam_channel::Receiver;
use progress::ScanProgress;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use walk::{display_path, resolve_root, walk_root, WalkItem};

/// Maximum number of progress messages that may queue up in the channel.
///
/// The frontend drains the channel continuously; if it stalls, the scanner
/// blocks rather than buffering without bound.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 1_024;

/// Tunables for one scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Number of concurrent detections. `1` is fully sequential; `0` means
    /// one per logical CPU.
    pub jobs: usize,
    /// Shared with the process runner so a cancelled scan also stops the
    /// external tool it is waiting on.
    pub cancel: CancelToken,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            cancel: CancelToken::new(),
        }
    }
}

/// Checks every supported file under a set of roots.
pub struct Scanner {
    detectors: DetectorSet,
    cancel: CancelToken,
    /// `None` when running sequentially.
    pool: Option<rayon::ThreadPool>,
}

impl Scanner {
    pub fn new(detectors: DetectorSet, options: ScanOptions) -> Self {
        let jobs = if options.jobs == 0 {
            num_cpus::get()
        } else {
            options.jobs
        };

        let pool = if jobs > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .thread_name(|i| format!("locksleuth-detect-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!("Could not start {jobs} detection workers ({e}); scanning sequentially");
                    None
                }
            }
        } else {
            None
        };

        Self {
            detectors,
            cancel: options.cancel,
            pool,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Scan `roots` (the current directory if empty) and return the report.
    pub fn scan(&self, roots: &[PathBuf]) -> ScanReport {
        self.scan_with(roots, |_| {})
    }

    /// Like [`Scanner::scan`], calling `on_progress` for every protected file
    /// and every non-fatal error as they are recorded.
    pub fn scan_with<F>(&self, roots: &[PathBuf], mut on_progress: F) -> ScanReport
    where
        F: FnMut(ScanProgress),
    {
        let start = Instant::now();
        let mut report = ScanReport::new();

        let default_root = [PathBuf::from(".")];
        let roots = if roots.is_empty() {
            &default_root[..]
        } else {
            roots
        };

        for root in roots {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            self.scan_root(root, &mut report, &mut on_progress);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scan finished: {} examined, {} protected, {} detection errors, {} walk errors in {:?}",
            report.files_examined,
            report.protected_count(),
            report.detection_errors,
            report.walk_errors,
            start.elapsed()
        );
        report
    }

    fn scan_root<F>(&self, root: &Path, report: &mut ScanReport, on_progress: &mut F)
    where
        F: FnMut(ScanProgress),
    {
        let abs_root = match resolve_root(root) {
            Ok(p) => p,
            Err(e) => {
                warn!("Error resolving base path {}: {e}", root.display());
                report.walk_errors += 1;
                on_progress(ScanProgress::Error {
                    path: root.display().to_string(),
                    message: format!("error resolving base path: {e}"),
                });
                return;
            }
        };

        if let Err(e) = std::fs::symlink_metadata(&abs_root) {
            warn!("Error accessing {}: {e}", abs_root.display());
            report.walk_errors += 1;
            on_progress(ScanProgress::Error {
                path: abs_root.display().to_string(),
                message: e.to_string(),
            });
            return;
        }

        debug!("Scanning {}", abs_root.display());

        let mut candidates = Vec::new();
        for item in walk_root(&abs_root) {
            match item {
                WalkItem::File(path) => {
                    let candidate = FileCandidate::new(path);
                    if candidate.format.is_supported() {
                        candidates.push(candidate);
                    }
                }
                WalkItem::Error { path, message } => {
                    let shown = path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| abs_root.display().to_string());
                    warn!("Error accessing {shown}: {message}");
                    report.walk_errors += 1;
                    on_progress(ScanProgress::Error {
                        path: shown,
                        message,
                    });
                }
            }
        }

        let results: Vec<(DetectionOutcome, Option<DetectError>)> = match &self.pool {
            Some(pool) => pool.install(|| candidates.par_iter().map(|c| self.check(c)).collect()),
            None => candidates.iter().map(|c| self.check(c)).collect(),
        };

        for (candidate, (outcome, error)) in candidates.into_iter().zip(results) {
            report.files_examined += 1;

            if let Some(err) = error {
                warn!("Error checking {}: {err}", candidate.path.display());
                report.detection_errors += 1;
                on_progress(ScanProgress::Error {
                    path: candidate.path.display().to_string(),
                    message: err.to_string(),
                });
            }

            match outcome {
                DetectionOutcome::Protected => {
                    let finding = Finding {
                        display: display_path(&abs_root, &candidate.path),
                        root: abs_root.clone(),
                        path: candidate.path,
                        format: candidate.format,
                    };
                    on_progress(ScanProgress::Protected(finding.clone()));
                    report.findings.push(finding);
                }
                DetectionOutcome::NotProtected => {}
                DetectionOutcome::Skipped(SkipReason::OfficeToolUnavailable) => {
                    report.record_office_skipped();
                }
                DetectionOutcome::Skipped(SkipReason::Cancelled) => {
                    report.cancelled = true;
                }
            }
        }
    }

    /// Check one candidate. Errors are returned alongside a `NotProtected`
    /// outcome so the caller can log them in walk order.
    fn check(&self, candidate: &FileCandidate) -> (DetectionOutcome, Option<DetectError>) {
        if self.cancel.is_cancelled() {
            return (DetectionOutcome::Skipped(SkipReason::Cancelled), None);
        }

        let Some(detector) = self.detectors.for_format(candidate.format) else {
            return match candidate.format {
                DocumentFormat::Office => {
                    trace!("Skipping {}: Office tool unavailable", candidate.path.display());
                    (DetectionOutcome::Skipped(SkipReason::OfficeToolUnavailable), None)
                }
                _ => (DetectionOutcome::NotProtected, None),
            };
        };

        match detector.detect(&candidate.path) {
            Ok(verdict) => {
                trace!(
                    "{} [{} {}]: {:?}",
                    candidate.path.display(),
                    detector.format(),
                    detector.strategy(),
                    verdict
                );
                (verdict.into(), None)
            }
            // A tool killed because the scan was cancelled says nothing
            // about the file. Any other failure is still an error.
            Err(DetectError::Tool {
                source: RunError::Cancelled { .. },
                ..
            }) => (DetectionOutcome::Skipped(SkipReason::Cancelled), None),
            Err(e) => (DetectionOutcome::NotProtected, Some(e)),
        }
    }
}

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    /// Receiver for progress updates; the last message is always
    /// `Complete` or `Cancelled`.
    pub progress_rx: Receiver<ScanProgress>,
    cancel: CancelToken,
    _thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Start `scanner` on a background thread.
pub fn start_scan(scanner: Scanner, roots: Vec<PathBuf>) -> std::io::Result<ScanHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel = scanner.cancel_token().clone();

    let thread = thread::Builder::new()
        .name("locksleuth-scanner".into())
        .spawn(move || {
            let tx = progress_tx.clone();
            let report = scanner.scan_with(&roots, |msg| {
                let _ = tx.send(msg);
            });
            let done = if report.cancelled {
                ScanProgress::Cancelled(Box::new(report))
            } else {
                ScanProgress::Complete(Box::new(report))
            };
            let _ = progress_tx.send(done);
        })?;

    Ok(ScanHandle {
        progress_rx,
        cancel,
        _thread: Some(thread),
    })
}
