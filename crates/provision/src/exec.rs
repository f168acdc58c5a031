//! Running the Project-Env CLI.
//!
//! Standard error is handed to a callback line by line while the process
//! runs; standard output is collected whole and returned after exit.

use crate::error::{Error, Result};
use crate::types::AllToolInfos;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

/// Captured result of a finished process.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Everything written to standard output.
    pub stdout: String,
    /// Everything written to standard error.
    pub stderr: String,
}

/// Run `program` to completion.
///
/// Each standard error line is passed to `on_stderr` as soon as it is read.
/// Standard output is drained on a helper thread so a chatty process cannot
/// block on a full pipe.
pub fn run_streaming(
    program: &Path,
    args: &[String],
    mut on_stderr: impl FnMut(&str),
) -> Result<ProcessOutput> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::io(program, e))?;

    let stdout = child.stdout.take();
    let stdout_reader = thread::spawn(move || -> std::io::Result<String> {
        let mut captured = String::new();
        if let Some(mut out) = stdout {
            out.read_to_string(&mut captured)?;
        }
        Ok(captured)
    });

    let mut stderr = String::new();
    if let Some(err) = child.stderr.take() {
        let mut reader = BufReader::new(err);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    on_stderr(line);
                    stderr.push_str(line);
                    stderr.push('\n');
                }
                // Diagnostics only; the exit status decides the outcome.
                Err(e) => {
                    log::warn!("stopped reading stderr of {}: {}", program.display(), e);
                    break;
                }
            }
        }
    }

    let status = child.wait().map_err(|e| Error::io(program, e))?;
    let stdout = stdout_reader
        .join()
        .map_err(|_| Error::ToolOutputInvalid("stdout reader panicked".to_string()))?
        .map_err(|e| Error::ToolOutputInvalid(e.to_string()))?;

    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

/// Run the CLI and parse its tool infos.
///
/// Diagnostics are logged at info level as they arrive.
///
/// # Errors
///
/// Returns `Error::ToolExecutionFailed` on a non-zero exit and
/// `Error::ToolOutputInvalid` when standard output is not a tool info
/// document.
pub fn execute_cli(executable: &Path, args: &[String]) -> Result<AllToolInfos> {
    log::info!("running {} {}", executable.display(), args.join(" "));

    let output = run_streaming(executable, args, |line| log::info!("{line}"))?;
    if !output.status.success() {
        return Err(Error::ToolExecutionFailed {
            status: output.status.to_string(),
            stderr: output.stderr,
        });
    }

    parse_tool_infos(&output.stdout)
}

/// Parse the CLI's standard output.
pub fn parse_tool_infos(stdout: &str) -> Result<AllToolInfos> {
    Ok(serde_json::from_str(stdout)?)
}
