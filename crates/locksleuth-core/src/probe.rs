/// Dependency probing: decides, once per run, which tools are reachable
/// and which strategy each format uses.
///
/// Policy: a tool is *required* exactly when an explicitly chosen strategy
/// needs it. Asking for `--pdf-strategy delegated` on a machine without
/// qpdf is fatal before any file is touched. With the default `auto`
/// choices PDF and ZIP are checked natively, so nothing is required. The
/// Office tool is never required: without it Office files are skipped and
/// a single advisory is shown at the end.
use crate::detect::Strategy;
use crate::platform::{Tool, ToolHost};
use crate::process::ProcessRunner;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// What the user asked for, per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyChoice {
    /// Native decoding (always available for PDF and ZIP).
    #[default]
    Auto,
    Native,
    Delegated,
}

impl StrategyChoice {
    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Native => "native",
            Self::Delegated => "delegated",
        }
    }
}

impl fmt::Display for StrategyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs to [`probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    pub host: ToolHost,
    pub pdf: StrategyChoice,
    pub zip: StrategyChoice,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            host: ToolHost::detect(),
            pdf: StrategyChoice::Auto,
            zip: StrategyChoice::Auto,
        }
    }
}

/// Reachability of each external tool on the chosen host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolAvailability {
    pub pdf: bool,
    pub zip: bool,
    pub office: bool,
}

impl ToolAvailability {
    pub fn get(&self, tool: Tool) -> bool {
        match tool {
            Tool::Qpdf => self.pdf,
            Tool::Zipinfo => self.zip,
            Tool::MsOffCrypto => self.office,
        }
    }
}

/// Everything a scan needs to know about its environment.
///
/// Computed once before traversal and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub host: ToolHost,
    pub tools: ToolAvailability,
    pub pdf_strategy: Strategy,
    pub zip_strategy: Strategy,
}

impl ScanConfig {
    /// Native PDF/ZIP checks with the given Office availability. No probing.
    pub fn native(host: ToolHost, office: bool) -> Self {
        Self {
            host,
            tools: ToolAvailability {
                office,
                ..ToolAvailability::default()
            },
            pdf_strategy: Strategy::Native,
            zip_strategy: Strategy::Native,
        }
    }
}

/// Conditions that stop a run before traversal begins.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("WSL not found; install WSL to run delegated checks on this host")]
    ToolHostMissing,
    #[error("{tool} not found on the {host} tool host; please {hint}")]
    RequiredToolMissing {
        tool: Tool,
        host: ToolHost,
        hint: &'static str,
    },
}

/// Probe the tool host and resolve per-format strategies.
pub fn probe(options: ProbeOptions, runner: &dyn ProcessRunner) -> Result<ScanConfig, ProbeError> {
    let host = options.host;
    let needs_pdf_tool = options.pdf == StrategyChoice::Delegated;
    let needs_zip_tool = options.zip == StrategyChoice::Delegated;

    let launcher = host.launcher_available(runner);
    if !launcher && (needs_pdf_tool || needs_zip_tool) {
        return Err(ProbeError::ToolHostMissing);
    }

    let check = |tool: Tool| launcher && host.tool_available(runner, tool);
    let tools = ToolAvailability {
        pdf: check(Tool::Qpdf),
        zip: check(Tool::Zipinfo),
        office: check(Tool::MsOffCrypto),
    };
    debug!(?host, ?tools, "tool probe complete");

    for (needed, tool) in [(needs_pdf_tool, Tool::Qpdf), (needs_zip_tool, Tool::Zipinfo)] {
        if needed && !tools.get(tool) {
            return Err(ProbeError::RequiredToolMissing {
                tool,
                host,
                hint: tool.install_hint(),
            });
        }
    }

    let resolve = |choice: StrategyChoice| match choice {
        StrategyChoice::Auto | StrategyChoice::Native => Strategy::Native,
        StrategyChoice::Delegated => Strategy::Delegated,
    };
    let config = ScanConfig {
        host,
        tools,
        pdf_strategy: resolve(options.pdf),
        zip_strategy: resolve(options.zip),
    };

    info!(
        "Tool host {}: pdf={} zip={} office={}",
        host,
        config.pdf_strategy,
        config.zip_strategy,
        if tools.office { "delegated" } else { "unavailable" }
    );
    Ok(config)
}
