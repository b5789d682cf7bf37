//! Child process execution shared by the execution, git and code tools

use crate::{Result, ToolError};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Captured result of a finished child process
#[derive(Debug)]
pub(crate) struct ProcessOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Run `program args...` in `cwd`, killing it once `limit` elapses.
pub(crate) async fn run(
    program: &str,
    args: &[&str],
    cwd: &Path,
    limit: Duration,
) -> Result<ProcessOutput> {
    if !cwd.exists() {
        return Err(ToolError::NotFound(format!(
            "Working directory not found: {}",
            cwd.display()
        )));
    }

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let started = Instant::now();
    // The child is dropped (and killed) if the timeout fires first.
    let result = timeout(limit, async {
        let child = cmd.spawn()?;
        let output = child.wait_with_output().await?;
        Ok::<_, ToolError>(output)
    })
    .await;

    match result {
        Ok(Ok(output)) => Ok(ProcessOutput {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: started.elapsed(),
        }),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ToolError::Timeout(format!(
            "{} timed out after {} seconds",
            program,
            limit.as_secs()
        ))),
    }
}
