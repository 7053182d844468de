/// External process delegation.
///
/// Every call to an outside tool (qpdf, zipinfo, msoffcrypto-tool, wsl,
/// wslpath) goes through the [`ProcessRunner`] trait: the caller hands over a
/// [`CommandSpec`] and gets back the exit status plus raw stdout/stderr.
/// Detectors interpret that output; runners only execute.
///
/// - [`SystemRunner`] spawns real processes with a bounded wait and honours a
///   shared [`CancelToken`].
/// - [`ScriptedRunner`] answers from a closure so detectors and the scanner
///   can be exercised without any tool installed.
pub mod scripted;
pub mod system;

pub use scripted::ScriptedRunner;
pub use system::{find_in_path, SystemRunner, DEFAULT_TOOL_TIMEOUT};

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[inline]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, the way a terminal would interleave them
    /// for tools that write one message per stream.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// Errors from launching or waiting on an external process.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error while waiting on external process: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} did not finish within {}s and was terminated", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("{program} was terminated because the scan was cancelled")]
    Cancelled { program: String },
}

/// Runs external programs on behalf of detectors and the prober.
pub trait ProcessRunner: Send + Sync {
    /// Run `cmd` to completion (or until the runner gives up on it).
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, RunError>;

    /// Resolve `program` through the host's executable search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Shared cancellation flag.
///
/// Cloned into the scanner and the process runner; cancelling one clone
/// is visible to all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
