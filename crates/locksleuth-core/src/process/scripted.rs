/// A process runner that never spawns anything.
///
/// Responses come from a caller-supplied closure and `locate` answers from a
/// fixed list of tool names. Every command is recorded so tests can assert
/// what would have been executed (or that nothing was).
use super::{CommandSpec, ProcessOutput, ProcessRunner, RunError};
use parking_lot::Mutex;
use std::path::PathBuf;

type Handler = dyn Fn(&CommandSpec) -> Result<ProcessOutput, RunError> + Send + Sync;

pub struct ScriptedRunner {
    tools: Vec<String>,
    handler: Box<Handler>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    /// Build a runner whose every `run` is answered by `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<ProcessOutput, RunError> + Send + Sync + 'static,
    {
        Self {
            tools: Vec::new(),
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A runner where no tool exists and every command fails to launch.
    pub fn empty() -> Self {
        Self::new(|cmd| {
            Err(RunError::Spawn {
                program: cmd.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        })
    }

    /// Declare which program names `locate` will find.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, RunError> {
        self.calls.lock().push(cmd.clone());
        (self.handler)(cmd)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.tools
            .iter()
            .any(|t| t == program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}
