/// Detection results.
///
/// Detectors answer with a two-valued [`Verdict`] (or an error). The
/// scanner widens that into the tri-state [`DetectionOutcome`], adding
/// `Skipped` for files it chose not to check.
use serde::Serialize;

/// What a detector concluded about one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Protected,
    NotProtected,
}

impl Verdict {
    #[inline]
    pub fn from_protected(protected: bool) -> Self {
        if protected {
            Self::Protected
        } else {
            Self::NotProtected
        }
    }

    #[inline]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Protected)
    }
}

/// Why a file was not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The external Office tool is not reachable on this host.
    OfficeToolUnavailable,
    /// The scan was cancelled before this file was reached.
    Cancelled,
}

/// The per-file result recorded by the scanner.
///
/// A detector error is not an outcome of its own: it is logged, counted,
/// and recorded as `NotProtected` so the walk carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionOutcome {
    Protected,
    NotProtected,
    Skipped(SkipReason),
}

impl From<Verdict> for DetectionOutcome {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Protected => Self::Protected,
            Verdict::NotProtected => Self::NotProtected,
        }
    }
}
