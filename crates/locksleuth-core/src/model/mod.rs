/// Data model for LockSleuth scans.
///
/// Re-exports format classification, detection outcomes, and the report
/// a scan hands back to its frontend.
pub mod format;
pub mod outcome;
pub mod report;

pub use format::{classify_extension, classify_path, DocumentFormat, FileCandidate};
pub use outcome::{DetectionOutcome, SkipReason, Verdict};
pub use report::{Finding, ScanReport};
