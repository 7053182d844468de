/// The end-of-run notice shown when Office files were left unchecked.
use locksleuth_core::model::ScanReport;
use locksleuth_core::platform::Tool;
use std::io::{self, Write};

/// Write the advisory if `report` skipped any Office file. Returns whether
/// anything was written.
pub fn write_office_advisory(out: &mut dyn Write, report: &ScanReport) -> io::Result<bool> {
    if !report.office_tool_missing {
        return Ok(false);
    }
    let tool = Tool::MsOffCrypto;
    writeln!(
        out,
        "Warning: {} Office file(s) (e.g. DOCX, XLSX, PPTX) were found but could not be \
         checked for password protection because {tool} is not installed.",
        report.office_skipped
    )?;
    writeln!(out, "To enable checking of Office files, install {tool}:")?;
    writeln!(out, "    {}", tool.install_hint())?;
    Ok(true)
}
