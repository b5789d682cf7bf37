//! Git tools backed by the `git` binary

use crate::process::{self, ProcessOutput};
use crate::{required_str, truncate, Result, Tool, ToolBundle, ToolContext, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const MAX_DIFF_BYTES: usize = 100_000;

/// Build the `git` category
pub fn toolset(ctx: &ToolContext) -> ToolBundle {
    ToolBundle::new()
        .with(Arc::new(GitStatusTool { ctx: ctx.clone() }))
        .with(Arc::new(GitDiffTool { ctx: ctx.clone() }))
        .with(Arc::new(GitLogTool { ctx: ctx.clone() }))
        .with(Arc::new(GitCommitTool { ctx: ctx.clone() }))
}

async fn git(ctx: &ToolContext, args: &[&str]) -> Result<ProcessOutput> {
    process::run("git", args, &ctx.workspace_root, ctx.command_timeout).await
}

/// Run git and turn a non-zero exit into an error carrying stderr
async fn git_ok(ctx: &ToolContext, args: &[&str]) -> Result<String> {
    let output = git(ctx, args).await?;
    if !output.success {
        return Err(ToolError::Command(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or(""),
            output.stderr.trim()
        )));
    }
    Ok(output.stdout)
}

/// Parse `git status --porcelain=v1 --branch` output into (branch, entries)
fn parse_status(stdout: &str) -> (Option<String>, Vec<Value>) {
    let mut branch = None;
    let mut files = Vec::new();

    for line in stdout.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            let name = header
                .strip_prefix("No commits yet on ")
                .unwrap_or(header)
                .split("...")
                .next()
                .unwrap_or(header);
            branch = Some(name.to_string());
        } else if line.len() > 3 {
            let (code, path) = line.split_at(3);
            files.push(json!({
                "status": code.trim(),
                "path": path
            }));
        }
    }
    (branch, files)
}

pub struct GitStatusTool {
    ctx: ToolContext,
}

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &str {
        "git_status"
    }

    fn description(&self) -> &str {
        "Show the current branch and the changed, staged and untracked files of the workspace repository."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        let stdout = git_ok(&self.ctx, &["status", "--porcelain=v1", "--branch"]).await?;
        let (branch, files) = parse_status(&stdout);

        Ok(json!({
            "branch": branch,
            "is_clean": files.is_empty(),
            "files": files
        }))
    }
}

pub struct GitDiffTool {
    ctx: ToolContext,
}

#[async_trait]
impl Tool for GitDiffTool {
    fn name(&self) -> &str {
        "git_diff"
    }

    fn description(&self) -> &str {
        "Show uncommitted changes, or staged changes with staged=true."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "staged": {
                    "type": "boolean",
                    "description": "Diff the index instead of the working tree (default: false)"
                },
                "file": {
                    "type": "string",
                    "description": "Limit the diff to one path"
                },
                "stat": {
                    "type": "boolean",
                    "description": "Only show the diffstat (default: false)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let mut git_args = vec!["diff"];
        if args["staged"].as_bool().unwrap_or(false) {
            git_args.push("--cached");
        }
        if args["stat"].as_bool().unwrap_or(false) {
            git_args.push("--stat");
        }
        if let Some(file) = args["file"].as_str() {
            git_args.push("--");
            git_args.push(file);
        }

        let stdout = git_ok(&self.ctx, &git_args).await?;
        let (diff, truncated) = truncate(stdout, MAX_DIFF_BYTES);
        Ok(json!({
            "has_changes": !diff.trim().is_empty(),
            "diff": diff,
            "truncated": truncated
        }))
    }
}

pub struct GitLogTool {
    ctx: ToolContext,
}

#[async_trait]
impl Tool for GitLogTool {
    fn name(&self) -> &str {
        "git_log"
    }

    fn description(&self) -> &str {
        "List recent commits with hash, author, date and subject."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "max_commits": {
                    "type": "integer",
                    "description": "Number of commits to return (default: 10)"
                },
                "author": {"type": "string"},
                "grep": {
                    "type": "string",
                    "description": "Only commits whose message matches"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let max_count = format!("--max-count={}", args["max_commits"].as_u64().unwrap_or(10));
        let mut git_args = vec![
            "log".to_string(),
            max_count,
            "--format=%H%x1f%an%x1f%ad%x1f%s".to_string(),
            "--date=iso".to_string(),
        ];
        if let Some(author) = args["author"].as_str() {
            git_args.push(format!("--author={}", author));
        }
        if let Some(grep) = args["grep"].as_str() {
            git_args.push(format!("--grep={}", grep));
        }
        let git_args: Vec<&str> = git_args.iter().map(String::as_str).collect();

        let stdout = git_ok(&self.ctx, &git_args).await?;
        let commits: Vec<Value> = stdout
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(4, '\u{1f}');
                let hash = parts.next()?;
                Some(json!({
                    "hash": &hash[..hash.len().min(8)],
                    "author": parts.next()?,
                    "date": parts.next()?,
                    "message": parts.next()?
                }))
            })
            .collect();

        Ok(json!({
            "total_commits": commits.len(),
            "commits": commits
        }))
    }
}

pub struct GitCommitTool {
    ctx: ToolContext,
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git_commit"
    }

    fn description(&self) -> &str {
        "Stage the given files (or everything with add_all) and create a commit."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string"},
                "files": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Paths to stage before committing"
                },
                "add_all": {
                    "type": "boolean",
                    "description": "Stage all changes before committing (default: false)"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let message = required_str(&args, "message")?;
        if message.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "commit message must not be empty".into(),
            ));
        }

        if args["add_all"].as_bool().unwrap_or(false) {
            git_ok(&self.ctx, &["add", "--all"]).await?;
        } else if let Some(files) = args["files"].as_array() {
            for file in files.iter().filter_map(Value::as_str) {
                // Staging goes through the same confinement as file tools.
                self.ctx.resolve(file)?;
                git_ok(&self.ctx, &["add", "--", file]).await?;
            }
        }

        git_ok(&self.ctx, &["commit", "-m", message]).await?;
        let hash = git_ok(&self.ctx, &["rev-parse", "--short=8", "HEAD"]).await?;

        Ok(json!({
            "success": true,
            "commit_hash": hash.trim(),
            "message": message
        }))
    }
}
