//! Shell command execution

use crate::{process, required_str, truncate, Result, Tool, ToolBundle, ToolContext, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Category name checked against the approval list
const CATEGORY: &str = "execution";

/// Maximum bytes of stdout/stderr returned to the model
const MAX_OUTPUT_BYTES: usize = 50_000;

/// Base commands refused in sandbox mode
pub const DANGEROUS_COMMANDS: &[&str] = &[
    "rm", "rmdir", "mv", "cp", "chmod", "chown", "sudo", "su", "curl", "wget", "ssh", "scp",
    "nc", "netcat", "kill", "killall", "pkill", "ps", "netstat", "lsof", "apt", "yum", "pip",
    "npm", "brew",
];

/// Shell metacharacters refused in sandbox mode
const DANGEROUS_PATTERNS: &[&str] = &["|", ">", "&", ";", "$(", "`"];

/// Build the `execution` category
pub fn toolset(ctx: &ToolContext) -> ToolBundle {
    ToolBundle::new().with(Arc::new(RunCommandTool::new(ctx.clone())))
}

/// Whether `command` starts with a denylisted program or chains/redirects.
pub fn is_dangerous_command(command: &str) -> bool {
    let base = command.split_whitespace().next().unwrap_or("");
    if DANGEROUS_COMMANDS.contains(&base) {
        return true;
    }
    DANGEROUS_PATTERNS.iter().any(|p| command.contains(p))
}

/// Tool for running a shell command in the workspace
pub struct RunCommandTool {
    ctx: ToolContext,
}

impl RunCommandTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run a shell command in the workspace and return its exit code, stdout and stderr. \
         Commands that delete, move, escalate privileges, touch the network, or use pipes \
         and redirects are refused unless allow_dangerous is set and execution does not \
         require approval."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to run with sh -c"
                },
                "working_dir": {
                    "type": "string",
                    "description": "Directory to run in, relative to the workspace root (default: root)"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: the configured command timeout)"
                },
                "allow_dangerous": {
                    "type": "boolean",
                    "description": "Run even if the command is on the sandbox denylist; ignored when execution requires approval (default: false)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let command = required_str(&args, "command")?.trim();
        if command.is_empty() {
            return Err(ToolError::InvalidArguments("command must not be empty".into()));
        }

        if self.ctx.sandbox_mode && is_dangerous_command(command) {
            let allow_dangerous = args["allow_dangerous"].as_bool().unwrap_or(false);
            if self.ctx.requires_approval(CATEGORY) {
                warn!(command, allow_dangerous, "Refusing dangerous command that requires approval");
                return Err(ToolError::PermissionDenied(format!(
                    "'{}' is potentially dangerous and {} requires approval",
                    command, CATEGORY
                )));
            }
            if !allow_dangerous {
                warn!(command, "Refusing dangerous command in sandbox mode");
                return Err(ToolError::PermissionDenied(format!(
                    "'{}' is potentially dangerous; set allow_dangerous to run it",
                    command
                )));
            }
        }

        let cwd = self.ctx.resolve(args["working_dir"].as_str().unwrap_or("."))?;
        let limit = args["timeout"]
            .as_u64()
            .map(Duration::from_secs)
            .unwrap_or(self.ctx.command_timeout);

        debug!(command, cwd = %cwd.display(), "Running command");
        let output = process::run("sh", &["-c", command], &cwd, limit).await?;

        let (stdout, stdout_truncated) = truncate(output.stdout, MAX_OUTPUT_BYTES);
        let (stderr, stderr_truncated) = truncate(output.stderr, MAX_OUTPUT_BYTES);

        Ok(json!({
            "command": command,
            "success": output.success,
            "exit_code": output.exit_code,
            "stdout": stdout,
            "stderr": stderr,
            "truncated": stdout_truncated || stderr_truncated,
            "execution_time_ms": output.elapsed.as_millis() as u64
        }))
    }
}
