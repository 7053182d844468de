/// Platform-specific functionality: where external tools run and how
/// their command lines are built.
///
/// Tools either run directly on this machine ([`ToolHost::Native`]) or inside
/// the Windows Subsystem for Linux ([`ToolHost::Wsl`]). The host is chosen at
/// startup, not at compile time, so every detector goes through the same
/// code path and tests can pick either host on any OS.
pub mod path;
pub mod tools;

pub use path::{to_host_path, PathError};
pub use tools::Tool;

use crate::process::{CommandSpec, ProcessRunner};
use std::fmt;
use tracing::debug;

/// The program used to reach the WSL environment from Windows.
pub const WSL_LAUNCHER: &str = "wsl";

/// Where delegated-strategy tools are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolHost {
    /// Tools are on this machine's `PATH`.
    Native,
    /// Tools live inside WSL and are reached through `wsl.exe`.
    Wsl,
}

impl ToolHost {
    /// The natural host for the running OS: WSL on Windows, native elsewhere.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Wsl
        } else {
            Self::Native
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Wsl => "wsl",
        }
    }

    /// Build the command line that runs `tool` with `args` on this host.
    ///
    /// Tools that are usually installed per-user (pip) run through a login
    /// shell inside WSL so `~/.local/bin` is on the search path.
    pub fn command(self, tool: Tool, args: &[String]) -> CommandSpec {
        match self {
            Self::Native => CommandSpec::new(tool.program()).args(args.iter().cloned()),
            Self::Wsl if tool.needs_login_shell() => {
                let mut script = tool.program().to_owned();
                for arg in args {
                    script.push(' ');
                    script.push_str(&shell_quote(arg));
                }
                CommandSpec::new(WSL_LAUNCHER).args(["bash", "-l", "-c"]).arg(script)
            }
            Self::Wsl => CommandSpec::new(WSL_LAUNCHER)
                .arg(tool.program())
                .args(args.iter().cloned()),
        }
    }

    /// `true` if the launcher this host depends on is reachable.
    ///
    /// The native host needs nothing; WSL needs `wsl` on `PATH`.
    pub fn launcher_available(self, runner: &dyn ProcessRunner) -> bool {
        match self {
            Self::Native => true,
            Self::Wsl => runner.locate(WSL_LAUNCHER).is_some(),
        }
    }

    /// `true` if `tool` can be executed on this host.
    pub fn tool_available(self, runner: &dyn ProcessRunner, tool: Tool) -> bool {
        match self {
            Self::Native => runner.locate(tool.program()).is_some(),
            Self::Wsl => {
                if !self.launcher_available(runner) {
                    return false;
                }
                let lookup = if tool.needs_login_shell() {
                    CommandSpec::new(WSL_LAUNCHER)
                        .args(["bash", "-l", "-c"])
                        .arg(format!("which {}", tool.program()))
                } else {
                    CommandSpec::new(WSL_LAUNCHER).args(["which", tool.program()])
                };
                match runner.run(&lookup) {
                    Ok(out) => out.success() && !out.stdout.trim().is_empty(),
                    Err(e) => {
                        debug!("WSL lookup for {} failed: {e}", tool.program());
                        false
                    }
                }
            }
        }
    }
}

impl fmt::Display for ToolHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quote `s` for a POSIX shell: wrap in single quotes, escaping embedded ones.
pub fn shell_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}
