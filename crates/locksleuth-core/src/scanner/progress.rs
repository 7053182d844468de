/// Scan progress reporting: messages sent from the scan thread to the
/// frontend via a crossbeam channel.
use crate::model::{Finding, ScanReport};

#[derive(Debug)]
pub enum ScanProgress {
    /// A protected file was found.
    Protected(Finding),
    /// A non-fatal error: an unreadable root or entry, or a failed check.
    Error { path: String, message: String },
    /// The walk finished for every root.
    Complete(Box<ScanReport>),
    /// The scan stopped early; the report holds what was found so far.
    Cancelled(Box<ScanReport>),
}
