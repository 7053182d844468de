/// Encryption detectors: one per document format.
///
/// Each format offers up to two interchangeable strategies:
/// - **Native:** decode the file's own structure in-process.
/// - **Delegated:** run an external tool and interpret its exit status or
///   text output.
///
/// Both sit behind the [`Detector`] trait so the scanner never knows which
/// one it is talking to. Office documents only have a delegated strategy.
///
/// Each strategy keeps its own tool's semantics. In particular the native
/// PDF path reports "protected" when parsing *fails* with the wrong-password
/// condition, while `qpdf --is-encrypted` reports "protected" when it
/// *succeeds*; no generic "exit code means protected" rule is shared.
pub mod office;
pub mod pdf;
pub mod zip;

pub use office::OfficeDelegated;
pub use pdf::{PdfDelegated, PdfNative};
pub use zip::{ZipDelegated, ZipNative};

use crate::model::{DocumentFormat, Verdict};
use crate::platform::{PathError, Tool, ToolHost};
use crate::probe::ScanConfig;
use crate::process::{ProcessRunner, RunError};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// How a format is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Native,
    Delegated,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Delegated => "delegated",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a single file could not be checked.
///
/// These never stop a scan: the scanner logs them and moves on.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unreadable ZIP archive: {0}")]
    Zip(#[from] ::zip::result::ZipError),
    #[error("corrupt ZIP archive: {0}")]
    CorruptZip(String),
    #[error("{tool} could not be run: {source}")]
    Tool {
        tool: Tool,
        #[source]
        source: RunError,
    },
    #[error("{tool} failed (exit {code:?}): {stderr}")]
    ToolFailed {
        tool: Tool,
        code: Option<i32>,
        stderr: String,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

/// A format-specific encryption check.
pub trait Detector: Send + Sync {
    fn format(&self) -> DocumentFormat;

    fn strategy(&self) -> Strategy;

    /// Decide whether the file at `path` is password-protected.
    fn detect(&self, path: &Path) -> Result<Verdict, DetectError>;
}

/// Shared plumbing for every delegated detector.
#[derive(Clone)]
pub struct Delegation {
    pub host: ToolHost,
    pub runner: Arc<dyn ProcessRunner>,
}

impl Delegation {
    pub fn new(host: ToolHost, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { host, runner }
    }

    /// Confirm the file is readable here, then translate its path for the host.
    ///
    /// The local open surfaces permission errors as I/O errors instead of
    /// letting the tool misreport an unreadable file as unprotected.
    fn prepare(&self, path: &Path) -> Result<String, DetectError> {
        drop(File::open(path)?);
        Ok(crate::platform::to_host_path(
            self.host,
            self.runner.as_ref(),
            path,
        )?)
    }

    fn run(
        &self,
        tool: Tool,
        args: &[String],
    ) -> Result<crate::process::ProcessOutput, DetectError> {
        let cmd = self.host.command(tool, args);
        self.runner
            .run(&cmd)
            .map_err(|source| DetectError::Tool { tool, source })
    }
}

/// The detectors selected for one scan.
pub struct DetectorSet {
    pdf: Box<dyn Detector>,
    zip: Box<dyn Detector>,
    /// `None` when the Office tool is unavailable.
    office: Option<Box<dyn Detector>>,
}

impl DetectorSet {
    pub fn new(
        pdf: Box<dyn Detector>,
        zip: Box<dyn Detector>,
        office: Option<Box<dyn Detector>>,
    ) -> Self {
        Self { pdf, zip, office }
    }

    /// Instantiate the strategies chosen by the prober.
    pub fn from_config(config: &ScanConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let delegation = Delegation::new(config.host, runner);

        let pdf: Box<dyn Detector> = match config.pdf_strategy {
            Strategy::Native => Box::new(PdfNative),
            Strategy::Delegated => Box::new(PdfDelegated::new(delegation.clone())),
        };
        let zip: Box<dyn Detector> = match config.zip_strategy {
            Strategy::Native => Box::new(ZipNative),
            Strategy::Delegated => Box::new(ZipDelegated::new(delegation.clone())),
        };
        let office: Option<Box<dyn Detector>> = config
            .tools
            .office
            .then(|| Box::new(OfficeDelegated::new(delegation)) as Box<dyn Detector>);

        Self { pdf, zip, office }
    }

    /// The detector for `format`, if one is active.
    pub fn for_format(&self, format: DocumentFormat) -> Option<&dyn Detector> {
        match format {
            DocumentFormat::Pdf => Some(self.pdf.as_ref()),
            DocumentFormat::Zip => Some(self.zip.as_ref()),
            DocumentFormat::Office => self.office.as_deref(),
            DocumentFormat::Unsupported => None,
        }
    }

    pub fn office_available(&self) -> bool {
        self.office.is_some()
    }
}
