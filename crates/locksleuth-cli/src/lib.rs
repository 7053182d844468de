/// LockSleuth CLI: command-line frontend.
///
/// This crate parses arguments, probes the tool host, drives a background
/// scan and renders its results. Detection logic lives in `locksleuth-core`.
pub mod advisory;
pub mod args;
pub mod render;

pub use args::{Cli, OutputFormat};

use anyhow::{bail, Context};
use clap::Parser;
use locksleuth_core::detect::DetectorSet;
use locksleuth_core::model::ScanReport;
use locksleuth_core::probe::probe;
use locksleuth_core::process::{CancelToken, ProcessRunner, SystemRunner};
use locksleuth_core::scanner::progress::ScanProgress;
use locksleuth_core::scanner::{start_scan, ScanOptions, Scanner};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::debug;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "LOCKSLEUTH_LOG";

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Run a scan against the real system, writing to stdout and stderr.
pub fn run(cli: &Cli) -> anyhow::Result<ScanReport> {
    let cancel = CancelToken::new();
    let runner = Arc::new(SystemRunner::new(cli.tool_timeout(), cancel.clone()));
    let stdout = io::stdout();
    let stderr = io::stderr();
    run_with(cli, runner, cancel, &mut stdout.lock(), &mut stderr.lock())
}

/// Probe, scan and render with an explicit runner and output streams.
pub fn run_with(
    cli: &Cli,
    runner: Arc<dyn ProcessRunner>,
    cancel: CancelToken,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> anyhow::Result<ScanReport> {
    let config = probe(cli.probe_options(), runner.as_ref()).context("dependency check failed")?;
    let detectors = DetectorSet::from_config(&config, runner);
    let scanner = Scanner::new(
        detectors,
        ScanOptions {
            jobs: cli.jobs,
            cancel,
        },
    );
    let handle =
        start_scan(scanner, cli.paths.clone()).context("failed to start the scanner thread")?;

    let report = loop {
        let msg = match handle.progress_rx.recv() {
            Ok(msg) => msg,
            Err(_) => bail!("scanner stopped without producing a report"),
        };
        match msg {
            ScanProgress::Protected(finding) => {
                if cli.format == OutputFormat::Text {
                    if let Err(e) = render::write_text_line(out, &finding) {
                        handle.cancel();
                        return Err(e).context("failed to write output");
                    }
                }
            }
            // Already logged by the scanner.
            ScanProgress::Error { path, .. } => debug!("frontend saw error for {path}"),
            ScanProgress::Complete(report) | ScanProgress::Cancelled(report) => break *report,
        }
    };

    match cli.format {
        OutputFormat::Text => {}
        OutputFormat::Json => render::write_json(out, &report).context("failed to write JSON")?,
        OutputFormat::Csv => render::write_csv(out, &report).context("failed to write CSV")?,
    }
    out.flush().context("failed to write output")?;

    advisory::write_office_advisory(err, &report).context("failed to write advisory")?;
    Ok(report)
}
