/// Output writers for the three report formats.
///
/// Text is streamed: the caller writes each finding as it arrives. JSON and
/// CSV need the whole report and are written once the scan is over.
use locksleuth_core::model::{DocumentFormat, Finding, ScanReport};
use serde::Serialize;
use std::io::{self, Write};

/// One text line: the path relative to its scan root.
pub fn write_text_line(out: &mut dyn Write, finding: &Finding) -> io::Result<()> {
    writeln!(out, "{}", finding.display)
}

pub fn write_json(out: &mut dyn Write, report: &ScanReport) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

#[derive(Serialize)]
struct CsvRow<'a> {
    root: String,
    path: &'a str,
    format: DocumentFormat,
}

/// Header `root,path,format`, then one row per finding in report order.
pub fn write_csv(out: &mut dyn Write, report: &ScanReport) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if report.findings.is_empty() {
        writer.write_record(["root", "path", "format"])?;
    }
    for finding in &report.findings {
        writer.serialize(CsvRow {
            root: finding.root.display().to_string(),
            path: &finding.display,
            format: finding.format,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report() -> ScanReport {
        let mut report = ScanReport::new();
        report.files_examined = 3;
        report.findings = vec![
            Finding {
                root: PathBuf::from("/data"),
                path: PathBuf::from("/data/sub/locked.pdf"),
                display: "sub/locked.pdf".into(),
                format: DocumentFormat::Pdf,
            },
            Finding {
                root: PathBuf::from("/data"),
                path: PathBuf::from("/data/b, c.zip"),
                display: "b, c.zip".into(),
                format: DocumentFormat::Zip,
            },
        ];
        report
    }

    #[test]
    fn text_line_is_display_path() {
        let mut buf = Vec::new();
        write_text_line(&mut buf, &report().findings[0]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "sub/locked.pdf\n");
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &report()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "root,path,format\n/data,sub/locked.pdf,pdf\n/data,\"b, c.zip\",zip\n"
        );
    }

    #[test]
    fn csv_without_findings_still_has_header() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &ScanReport::new()).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "root,path,format\n");
    }

    #[test]
    fn json_carries_findings_and_counters() {
        let mut buf = Vec::new();
        write_json(&mut buf, &report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["files_examined"], 3);
        assert_eq!(value["findings"][0]["display"], "sub/locked.pdf");
        assert_eq!(value["findings"][1]["format"], "zip");
        assert_eq!(value["office_tool_missing"], false);
    }
}
