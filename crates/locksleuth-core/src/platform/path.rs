/// Path translation for the tool host.
///
/// Windows paths mean nothing inside WSL, so before a delegated detector
/// hands a path to a WSL tool it is converted with `wslpath`. A failed
/// conversion is an error: passing the untranslated path along would make
/// the tool report "not encrypted" for a file it simply could not open.
use super::{ToolHost, WSL_LAUNCHER};
use crate::process::{CommandSpec, ProcessRunner, RunError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("could not run wslpath for {path}: {source}")]
    Run {
        path: String,
        #[source]
        source: RunError,
    },
    #[error("wslpath rejected {path} (exit {code:?}): {stderr}")]
    Rejected {
        path: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("wslpath returned nothing for {path}")]
    Empty { path: String },
}

/// Translate `path` into the form the tool host expects.
pub fn to_host_path(
    host: ToolHost,
    runner: &dyn ProcessRunner,
    path: &Path,
) -> Result<String, PathError> {
    let native = path.to_string_lossy();
    match host {
        ToolHost::Native => Ok(native.into_owned()),
        ToolHost::Wsl => {
            // `wsl` re-parses its arguments, consuming one level of backslashes.
            let escaped = native.replace('\\', "\\\\");
            let cmd = CommandSpec::new(WSL_LAUNCHER).args(["wslpath".to_owned(), escaped]);
            let out = runner.run(&cmd).map_err(|source| PathError::Run {
                path: native.to_string(),
                source,
            })?;
            if !out.success() {
                return Err(PathError::Rejected {
                    path: native.into_owned(),
                    code: out.code,
                    stderr: out.stderr.trim().to_owned(),
                });
            }
            let converted = out.stdout.trim();
            if converted.is_empty() {
                return Err(PathError::Empty {
                    path: native.into_owned(),
                });
            }
            Ok(converted.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessOutput, ScriptedRunner};

    #[test]
    fn native_host_passes_path_through_without_spawning() {
        let runner = ScriptedRunner::empty();
        let p = to_host_path(ToolHost::Native, &runner, Path::new("/data/a.pdf")).unwrap();
        assert_eq!(p, "/data/a.pdf");
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn wsl_host_doubles_backslashes_and_trims_output() {
        let runner = ScriptedRunner::new(|_| Ok(ProcessOutput::exited(0, "/mnt/c/data/a.pdf\n", "")));
        let p = to_host_path(ToolHost::Wsl, &runner, Path::new(r"C:\data\a.pdf")).unwrap();
        assert_eq!(p, "/mnt/c/data/a.pdf");
        let calls = runner.calls();
        assert_eq!(calls[0].program, "wsl");
        assert_eq!(calls[0].args, vec!["wslpath", r"C:\\data\\a.pdf"]);
    }

    #[test]
    fn wsl_conversion_failure_is_an_error() {
        let runner = ScriptedRunner::new(|_| Ok(ProcessOutput::exited(1, "", "wslpath: bad path")));
        let err = to_host_path(ToolHost::Wsl, &runner, Path::new(r"C:\x.pdf")).unwrap_err();
        assert!(matches!(err, PathError::Rejected { .. }), "got {err:?}");
    }

    #[test]
    fn wsl_empty_output_is_an_error() {
        let runner = ScriptedRunner::new(|_| Ok(ProcessOutput::exited(0, "  \n", "")));
        let err = to_host_path(ToolHost::Wsl, &runner, Path::new(r"C:\x.pdf")).unwrap_err();
        assert!(matches!(err, PathError::Empty { .. }));
    }

    #[test]
    fn wsl_launch_failure_is_an_error() {
        let runner = ScriptedRunner::empty();
        let err = to_host_path(ToolHost::Wsl, &runner, Path::new(r"C:\x.pdf")).unwrap_err();
        assert!(matches!(err, PathError::Run { .. }));
    }
}
