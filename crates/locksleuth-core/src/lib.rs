/// LockSleuth Core: format classification, encryption detection, and scanning.
///
/// This crate contains all detection logic with zero terminal I/O.
/// Frontends (the CLI today) assemble a [`probe::ScanConfig`], run a scan,
/// and render the returned [`model::ScanReport`].
///
/// # Modules
///
/// - [`model`]: Document formats, candidates, outcomes, and the scan report.
/// - [`process`]: Narrow interface over external executables with bounded waits.
/// - [`platform`]: Tool host selection (native or WSL) and path translation.
/// - [`detect`]: Per-format encryption detectors (native and delegated).
/// - [`probe`]: One-shot dependency probing and strategy selection.
/// - [`scanner`]: Tree walking, dispatch, and report accumulation.
pub mod detect;
pub mod model;
pub mod platform;
pub mod probe;
pub mod process;
pub mod scanner;
