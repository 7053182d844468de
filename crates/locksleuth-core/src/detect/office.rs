/// Office document encryption detection (delegated only).
///
/// `msoffcrypto-tool <file> -t -v` tests whether a document is encrypted and,
/// with `-v`, logs its conclusion. The combined stdout+stderr text is read
/// with one rule on every host: protected iff it mentions "encrypted" and
/// does not say "not encrypted". Requiring the positive word keeps tracebacks
/// for unreadable files from being counted as protected. The tool echoes the
/// file's path, so the path and its file name are removed from the text
/// before the rule runs.
///
/// The scanner never calls this detector when the tool is unavailable; it
/// records a skip instead.
use super::{Delegation, DetectError, Detector, Strategy};
use crate::model::{DocumentFormat, Verdict};
use crate::platform::Tool;
use std::path::Path;
use tracing::trace;

#[derive(Clone)]
pub struct OfficeDelegated {
    delegation: Delegation,
}

impl OfficeDelegated {
    pub fn new(delegation: Delegation) -> Self {
        Self { delegation }
    }
}

impl Detector for OfficeDelegated {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Office
    }

    fn strategy(&self) -> Strategy {
        Strategy::Delegated
    }

    fn detect(&self, path: &Path) -> Result<Verdict, DetectError> {
        let host_path = self.delegation.prepare(path)?;
        let out = self.delegation.run(
            Tool::MsOffCrypto,
            &[host_path.clone(), "-t".to_owned(), "-v".to_owned()],
        )?;
        let text = out.combined();
        trace!("msoffcrypto-tool on {}: {}", path.display(), text.trim());
        Ok(Verdict::from_protected(office_output_reports_encryption(
            &text, &host_path,
        )))
    }
}

/// Interpret `msoffcrypto-tool -t -v` output for the file at `host_path`.
pub fn office_output_reports_encryption(output: &str, host_path: &str) -> bool {
    let lower = strip_echoed_path(output, host_path).to_lowercase();
    lower.contains("encrypted") && !lower.contains("not encrypted")
}

/// `output` without any echo of `host_path` or of its file name.
fn strip_echoed_path(output: &str, host_path: &str) -> String {
    let mut text = output.to_owned();
    if !host_path.is_empty() {
        text = text.replace(host_path, "");
    }
    let file_name = host_path.rsplit(['/', '\\']).next().unwrap_or_default();
    if !file_name.is_empty() {
        text = text.replace(file_name, "");
    }
    text
}
