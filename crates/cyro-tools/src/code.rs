//! Python snippet execution

use crate::{process, required_str, truncate, Result, Tool, ToolBundle, ToolContext, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const PYTHON: &str = "python3";
const MAX_OUTPUT_BYTES: usize = 50_000;

/// Build the `code` category
pub fn toolset(ctx: &ToolContext) -> ToolBundle {
    ToolBundle::new().with(Arc::new(ExecutePythonTool { ctx: ctx.clone() }))
}

/// Runs a snippet with `python3 -c`. In sandbox mode the interpreter is
/// started isolated (`-I`): no user site-packages, no PYTHON* env vars.
pub struct ExecutePythonTool {
    ctx: ToolContext,
}

#[async_trait]
impl Tool for ExecutePythonTool {
    fn name(&self) -> &str {
        "execute_python"
    }

    fn description(&self) -> &str {
        "Execute a Python 3 snippet in the workspace and return what it printed. \
         Use print() to surface results."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python source to run"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: the configured command timeout)"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let code = required_str(&args, "code")?;
        if code.trim().is_empty() {
            return Err(ToolError::InvalidArguments("code must not be empty".into()));
        }
        let limit = args["timeout"]
            .as_u64()
            .map(Duration::from_secs)
            .unwrap_or(self.ctx.command_timeout);

        let mut py_args = Vec::with_capacity(3);
        if self.ctx.sandbox_mode {
            py_args.push("-I");
        }
        py_args.extend(["-c", code]);

        let output = process::run(PYTHON, &py_args, &self.ctx.workspace_root, limit).await?;
        let (stdout, _) = truncate(output.stdout, MAX_OUTPUT_BYTES);
        let (stderr, _) = truncate(output.stderr, MAX_OUTPUT_BYTES);

        Ok(json!({
            "success": output.success,
            "output": stdout,
            "error": if stderr.is_empty() { Value::Null } else { Value::String(stderr) },
            "exit_code": output.exit_code,
            "execution_time_ms": output.elapsed.as_millis() as u64,
            "sandboxed": self.ctx.sandbox_mode
        }))
    }
}
