/// PDF encryption detection.
///
/// **Native:** reads the trailer and the `/Encrypt` dictionary directly. A
/// document is protected when it is encrypted and the empty user password
/// does not open it: the wrong-password condition. A file that cannot be
/// read as a PDF at all is "not protected": corrupt and unprotected are
/// deliberately not told apart. Nothing is written anywhere.
///
/// **Delegated:** `qpdf --is-encrypted <file>` exits 0 for an encrypted file
/// and non-zero otherwise.
mod security;
mod syntax;
mod trailer;

use super::{Delegation, DetectError, Detector, Strategy};
use crate::model::{DocumentFormat, Verdict};
use crate::platform::Tool;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, trace};
use trailer::{read_encryption, PdfError};

/// In-process PDF check.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfNative;

impl Detector for PdfNative {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn strategy(&self) -> Strategy {
        Strategy::Native
    }

    fn detect(&self, path: &Path) -> Result<Verdict, DetectError> {
        let mut reader = BufReader::new(File::open(path)?);
        match read_encryption(&mut reader) {
            Ok(None) => Ok(Verdict::NotProtected),
            Ok(Some(enc)) => {
                trace!(
                    filter = ?enc.filter,
                    revision = enc.r,
                    "{} is encrypted",
                    path.display()
                );
                // Owner-password-only documents open with an empty user password.
                Ok(Verdict::from_protected(!enc.opens_with_empty_user_password()))
            }
            Err(PdfError::Syntax(reason)) => {
                debug!("{}: {reason}; treating as not protected", path.display());
                Ok(Verdict::NotProtected)
            }
            Err(PdfError::Io(e)) => Err(e.into()),
        }
    }
}

/// `qpdf`-backed PDF check.
#[derive(Clone)]
pub struct PdfDelegated {
    delegation: Delegation,
}

impl PdfDelegated {
    pub fn new(delegation: Delegation) -> Self {
        Self { delegation }
    }
}

impl Detector for PdfDelegated {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn strategy(&self) -> Strategy {
        Strategy::Delegated
    }

    fn detect(&self, path: &Path) -> Result<Verdict, DetectError> {
        let host_path = self.delegation.prepare(path)?;
        let out = self
            .delegation
            .run(Tool::Qpdf, &["--is-encrypted".to_owned(), host_path])?;
        debug!(code = ?out.code, "qpdf --is-encrypted {}", path.display());
        Ok(Verdict::from_protected(out.success()))
    }
}
