/// Real process execution with a bounded wait.
///
/// The child's stdout and stderr are drained on two short-lived reader
/// threads that hand their buffers back over a channel, so a chatty tool can
/// never fill a pipe and deadlock against the wait loop. The wait loop polls
/// `try_wait`, and kills and reaps the child once the deadline passes or the
/// shared [`CancelToken`] is set.
///
/// On Unix the child leads its own process group and the whole group is
/// killed, so helpers it started (a shell's subprocesses, `wsl bash -l -c`)
/// die with it and release the pipes. On Windows only the direct child is
/// killed; its descendants can outlive it until they exit on their own, and
/// the reader threads holding their pipes linger until then.
use super::{CancelToken, CommandSpec, ProcessOutput, ProcessRunner, RunError};
use crossbeam_channel::{bounded, Sender};
use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default per-invocation limit for an external tool.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// How often the wait loop checks the child, the deadline, and the token.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Extra time allowed for the reader threads to hand over their buffers
/// after the child has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
    cancel: CancelToken,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT, CancelToken::new())
    }
}

impl SystemRunner {
    pub fn new(timeout: Duration, cancel: CancelToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, RunError> {
        trace!(command = %cmd, "spawning external tool");
        let start = Instant::now();

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;

        let (tx, rx) = bounded::<(Stream, Vec<u8>)>(2);
        if let Some(out) = child.stdout.take() {
            spawn_drain(out, Stream::Stdout, tx.clone())?;
        }
        if let Some(err) = child.stderr.take() {
            spawn_drain(err, Stream::Stderr, tx.clone())?;
        }
        drop(tx);

        let deadline = start + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.cancel.is_cancelled() {
                terminate(&mut child);
                return Err(RunError::Cancelled {
                    program: cmd.program.clone(),
                });
            }
            if Instant::now() >= deadline {
                terminate(&mut child);
                return Err(RunError::TimedOut {
                    program: cmd.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let mut output = ProcessOutput {
            code: status.code(),
            ..ProcessOutput::default()
        };
        // A grandchild that inherited the pipes can keep them open past the
        // child's exit; stop waiting for it after the grace period.
        let drain_deadline = Instant::now() + DRAIN_GRACE;
        while let Ok((stream, bytes)) = rx.recv_deadline(drain_deadline) {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            match stream {
                Stream::Stdout => output.stdout = text,
                Stream::Stderr => output.stderr = text,
            }
        }

        debug!(
            command = %cmd,
            code = ?output.code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "external tool finished"
        );
        Ok(output)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        find_in_path(program)
    }
}

fn spawn_drain<R>(mut pipe: R, stream: Stream, tx: Sender<(Stream, Vec<u8>)>) -> Result<(), RunError>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("locksleuth-pipe".into())
        .spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send((stream, buf));
        })?;
    Ok(())
}

/// Kill the child and everything in its process group, then reap it.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers. The child has not been reaped yet,
    // so its pid, which is also its group id, cannot have been reused.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        trace!(
            "killing process group {pgid} failed: {}",
            std::io::Error::last_os_error()
        );
    }
}

/// Search `PATH` for an executable named `program`.
///
/// A `program` that already contains a path separator is checked as given.
/// On Windows each `PATHEXT` suffix is tried as well.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    let suffixes = executable_suffixes();
    env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| {
            suffixes
                .iter()
                .map(move |suffix| dir.join(format!("{program}{suffix}")))
        })
        .find(|candidate| is_executable(candidate))
}

fn executable_suffixes() -> Vec<String> {
    let mut suffixes = vec![String::new()];
    if cfg!(windows) {
        let pathext = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_owned());
        suffixes.extend(
            pathext
                .split(';')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_ascii_lowercase()),
        );
    }
    suffixes
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").args(["-c", script])
    }

    #[test]
    fn run_captures_both_streams_and_exit_code() {
        let runner = SystemRunner::default();
        let out = runner
            .run(&sh("echo out; echo err 1>&2; exit 3"))
            .expect("sh must run");
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    /// A tool that hangs must be killed once the timeout expires instead of
    /// stalling the scan.
    #[test]
    fn run_times_out_and_kills_child() {
        let runner = SystemRunner::new(Duration::from_millis(200), CancelToken::new());
        let start = Instant::now();
        let err = runner.run(&sh("sleep 30")).unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }), "got {err:?}");
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "timeout must not wait for the child to finish"
        );
    }

    /// Background work the tool started must die with it; otherwise it
    /// keeps running and keeps the output pipes open after the timeout.
    #[test]
    fn timeout_kills_the_whole_process_group() {
        let tmp = tempfile::TempDir::new().unwrap();
        let marker = tmp.path().join("alive");
        let script = format!(
            "(sleep 1; echo alive > '{}') & sleep 30",
            marker.display()
        );
        let runner = SystemRunner::new(Duration::from_millis(200), CancelToken::new());
        let err = runner.run(&sh(&script)).unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }), "got {err:?}");

        thread::sleep(Duration::from_secs(2));
        assert!(
            !marker.exists(),
            "a background job of the killed tool kept running"
        );
    }

    #[test]
    fn run_honours_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let runner = SystemRunner::new(Duration::from_secs(30), token);
        let err = runner.run(&sh("sleep 30")).unwrap_err();
        assert!(matches!(err, RunError::Cancelled { .. }), "got {err:?}");
    }

    #[test]
    fn run_reports_spawn_failure() {
        let runner = SystemRunner::default();
        let err = runner
            .run(&CommandSpec::new("locksleuth-no-such-tool-xyz"))
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }), "got {err:?}");
    }

    #[test]
    fn find_in_path_locates_sh_but_not_nonsense() {
        assert!(find_in_path("sh").is_some());
        assert!(find_in_path("locksleuth-no-such-tool-xyz").is_none());
    }

    #[test]
    fn find_in_path_checks_explicit_paths_directly() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plain = tmp.path().join("not-exec");
        std::fs::write(&plain, b"#!/bin/sh\n").unwrap();
        assert!(find_in_path(plain.to_str().unwrap()).is_none());
    }
}
