/*!
 * Subprocess runner shared by the tool adapters.
 *
 * Every external call goes through `run_tool`, which races the child process
 * against a timeout and the caller's cancellation token. Children are spawned
 * with `kill_on_drop` so abandoning the future also terminates the process.
 */

use log::debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;

/// Output of a successful tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Decoded stdout
    pub stdout: String,
    /// Decoded stderr
    pub stderr: String,
}

/// Map a spawn error to a provider error
pub fn spawn_error(program: &str, error: std::io::Error) -> ProviderError {
    if error.kind() == std::io::ErrorKind::NotFound {
        ProviderError::ToolNotFound(program.to_string())
    } else {
        ProviderError::ExecutionFailed {
            program: program.to_string(),
            status: "spawn failed".to_string(),
            stderr: error.to_string(),
        }
    }
}

/// Run `program` with `args`, optionally feeding `stdin`
pub async fn run_tool(
    program: &str,
    args: &[String],
    stdin: Option<&str>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ToolOutput, ProviderError> {
    if cancel.is_cancelled() {
        return Err(ProviderError::Cancelled);
    }

    debug!("Running {} {}", program, args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    // Feed stdin from a separate task so a chatty child cannot deadlock on a full pipe
    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let input = input.to_string();
        tokio::spawn(async move {
            if let Err(e) = pipe.write_all(input.as_bytes()).await {
                debug!("Failed to write tool stdin: {}", e);
            }
            // Dropping the pipe closes stdin
        });
    }

    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("{} cancelled", program);
            return Err(ProviderError::Cancelled);
        }
        _ = tokio::time::sleep(timeout) => {
            return Err(ProviderError::Timeout {
                program: program.to_string(),
                secs: timeout.as_secs(),
            });
        }
        result = child.wait_with_output() => {
            result.map_err(|e| spawn_error(program, e))?
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(ProviderError::ExecutionFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: filter_stderr(&stderr),
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

/// Keep the last few meaningful stderr lines
fn filter_stderr(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return "no output on stderr".to_string();
    }

    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}
