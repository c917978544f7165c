//! Process execution helpers
//!
//! Scripts run by recipes capture their output so it can be attached to
//! the stack frame they produce. Plain commands used internally (mounting,
//! version checks) fail on a non-zero exit.

use anyhow::{Context, Result, bail};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::debug;

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or -1 if the process was killed by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run `cmd`, feed `input` on stdin, and capture everything.
///
/// Input is written from a separate thread while output is collected, so a
/// child that fills its stdout pipe before reading all of its input does
/// not stall. A non-zero exit is not an error here.
pub fn run_process(cmd: &[&str], input: Option<&str>) -> Result<ProcessOutput> {
    let Some((program, args)) = cmd.split_first() else {
        bail!("empty command");
    };
    debug!(command = ?cmd, "spawning process");

    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("command failed to start: {}", program))?;

    let stdin = child.stdin.take();
    let (output, written) = std::thread::scope(|scope| {
        // stdin is closed when the writer finishes so the child sees EOF
        let writer = stdin
            .zip(input)
            .map(|(mut stdin, input)| scope.spawn(move || stdin.write_all(input.as_bytes())));
        let output = child.wait_with_output();
        let written = match writer {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked"))),
            None => Ok(()),
        };
        (output, written)
    });

    let output = output.with_context(|| format!("cannot wait for {}", program))?;
    match written {
        // the child exited without reading everything
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!(command = ?cmd, "child closed stdin early")
        }
        other => other.with_context(|| format!("cannot write stdin of {}", program))?,
    }

    Ok(ProcessOutput {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run `cmd` and return its stdout, failing on a non-zero exit.
pub fn run_command(cmd: &[&str], input: Option<&str>) -> Result<String> {
    let output = run_process(cmd, input)?;
    if !output.success() {
        bail!(
            "command failed with exit code: {}\n  command: {}\n  stderr: {}",
            output.code,
            cmd.join(" "),
            output.stderr.trim()
        );
    }
    Ok(output.stdout)
}

/// Run a script with `bash -s -e`, script text on stdin.
pub fn run_bash_script(script: &str) -> Result<ProcessOutput> {
    run_process(&["bash", "-s", "-e"], Some(script))
}

/// Run a script as a Windows batch file.
///
/// The script is written to a temporary `.bat` file that is removed
/// afterwards.
pub fn run_batch_script(script: &str) -> Result<ProcessOutput> {
    let path = write_batch_file(script)?;
    let file = path.to_string_lossy().into_owned();
    run_process(&["cmd", "/C", &file], None)
}

fn write_batch_file(script: &str) -> Result<tempfile::TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("recipe-")
        .suffix(".bat")
        .tempfile()
        .context("cannot create batch file")?;
    file.write_all(script.as_bytes())
        .context("cannot write batch file")?;
    Ok(file.into_temp_path())
}

/// Start a script without waiting for it.
///
/// The child's output is discarded. On Windows the batch file is left
/// behind since the child may still be reading it.
pub fn start_script(script: &str, windows: bool) -> Result<()> {
    if windows {
        let path = write_batch_file(script)?
            .keep()
            .context("cannot keep batch file")?;
        Command::new("cmd")
            .args(["/C", "start", "/B"])
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("command failed to start: cmd")?;
        return Ok(());
    }

    let mut child = Command::new("bash")
        .args(["-s", "-e"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("command failed to start: bash")?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(script.as_bytes())
            .context("cannot write script to bash")?;
    }
    debug!(pid = child.id(), "started background script");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_bash_script_captures_output() {
        let out = run_bash_script("echo hello\necho oops >&2\n").unwrap();
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_bash_script_nonzero_is_not_error() {
        let out = run_bash_script("exit 3").unwrap();
        assert_eq!(out.code, 3);
        assert!(!out.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_bash_stops_at_first_failure() {
        let out = run_bash_script("false\necho unreachable\n").unwrap();
        assert_ne!(out.code, 0);
        assert!(out.stdout.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_fails_on_nonzero() {
        assert_eq!(run_command(&["echo", "hi"], None).unwrap(), "hi\n");
        let err = run_command(&["false"], None).unwrap_err();
        assert!(err.to_string().contains("exit code"));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_script_with_large_output() {
        // well past the pipe buffer in both directions
        let line = format!("echo {}\n", "x".repeat(100));
        let script = line.repeat(20_000);
        let out = run_bash_script(&script).unwrap();
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout.lines().count(), 20_000);
    }

    #[cfg(unix)]
    #[test]
    fn test_child_ignoring_stdin() {
        let input = "y".repeat(1 << 20);
        let out = run_process(&["true"], Some(&input)).unwrap();
        assert!(out.success());
    }

    #[test]
    fn test_missing_program() {
        let err = run_process(&["definitely-not-a-real-program-xyz"], None).unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn test_empty_command() {
        assert!(run_process(&[], None).is_err());
    }
}
