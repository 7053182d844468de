/// Command-line arguments.
use clap::{ArgAction, Parser, ValueEnum};
use locksleuth_core::platform::ToolHost;
use locksleuth_core::probe::{ProbeOptions, StrategyChoice};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "locksleuth",
    about = "Find password-protected PDF, ZIP and Office documents",
    version,
    author
)]
pub struct Cli {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Concurrent checks (0 = one per CPU)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Where external tools run [default: wsl on Windows, native elsewhere]
    #[arg(long, value_enum)]
    pub tool_host: Option<HostArg>,

    /// How PDF files are checked
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub pdf_strategy: StrategyArg,

    /// How ZIP files are checked
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub zip_strategy: StrategyArg,

    /// Seconds to wait for an external tool before killing it
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub tool_timeout: u64,

    /// More log output (repeat for more)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One path per line, printed as found
    Text,
    /// A single JSON report
    Json,
    /// `root,path,format` rows
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HostArg {
    Native,
    Wsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Auto,
    Native,
    Delegated,
}

impl From<HostArg> for ToolHost {
    fn from(arg: HostArg) -> Self {
        match arg {
            HostArg::Native => ToolHost::Native,
            HostArg::Wsl => ToolHost::Wsl,
        }
    }
}

impl From<StrategyArg> for StrategyChoice {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => StrategyChoice::Auto,
            StrategyArg::Native => StrategyChoice::Native,
            StrategyArg::Delegated => StrategyChoice::Delegated,
        }
    }
}

impl Cli {
    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            host: self.tool_host.map(ToolHost::from).unwrap_or_else(ToolHost::detect),
            pdf: self.pdf_strategy.into(),
            zip: self.zip_strategy.into(),
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout)
    }

    /// Default log directive for the verbosity flags. `LOCKSLEUTH_LOG`
    /// takes precedence when set.
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
