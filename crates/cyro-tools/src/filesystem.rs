//! Filesystem tools
//!
//! Every path argument is resolved through [`ToolContext::resolve`], so the
//! tools never touch anything outside the workspace root.

use crate::{required_str, Result, Tool, ToolBundle, ToolContext, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Build the `filesystem` category
pub fn toolset(ctx: &ToolContext) -> ToolBundle {
    ToolBundle::new()
        .with(Arc::new(ReadFileTool::new(ctx.clone())))
        .with(Arc::new(WriteFileTool::new(ctx.clone())))
        .with(Arc::new(ListDirectoryTool::new(ctx.clone())))
        .with(Arc::new(EditFileTool::new(ctx.clone())))
        .with(Arc::new(GlobSearchTool::new(ctx.clone())))
}

fn relative_display(ctx: &ToolContext, path: &Path) -> String {
    path.strip_prefix(&ctx.workspace_root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Tool for reading file contents
pub struct ReadFileTool {
    ctx: ToolContext,
}

impl ReadFileTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file inside the workspace. \
         Use offset and limit to read a window of lines from large files."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, relative to the workspace root"
                },
                "offset": {
                    "type": "integer",
                    "description": "First line to return, 0-based (default: 0)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to return (default: all)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let path = required_str(&args, "path")?;
        let full_path = self.ctx.resolve(path)?;

        let metadata = tokio::fs::metadata(&full_path)
            .await
            .map_err(|_| ToolError::NotFound(format!("File not found: {}", path)))?;
        if !metadata.is_file() {
            return Err(ToolError::InvalidArguments(format!(
                "{} is not a regular file",
                path
            )));
        }

        let max_bytes = self.ctx.max_file_size_kb * 1024;
        if metadata.len() > max_bytes {
            return Err(ToolError::PermissionDenied(format!(
                "{} is {} bytes, larger than the {} KB limit",
                path,
                metadata.len(),
                self.ctx.max_file_size_kb
            )));
        }

        let content = tokio::fs::read_to_string(&full_path).await?;
        let total_lines = content.lines().count();

        let offset = args["offset"].as_u64().unwrap_or(0) as usize;
        let limit = args["limit"].as_u64().map(|l| l as usize);
        let window: Vec<&str> = match limit {
            Some(limit) => content.lines().skip(offset).take(limit).collect(),
            None => content.lines().skip(offset).collect(),
        };

        Ok(json!({
            "path": path,
            "content": window.join("\n"),
            "total_lines": total_lines,
            "lines_returned": window.len(),
            "offset": offset
        }))
    }
}

/// Tool for writing file contents
pub struct WriteFileTool {
    ctx: ToolContext,
}

impl WriteFileTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file, creating parent directories as needed. \
         Existing content is overwritten."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let path = required_str(&args, "path")?;
        let content = required_str(&args, "content")?;
        let full_path = self.ctx.resolve(path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, content).await?;
        debug!(path = %full_path.display(), bytes = content.len(), "File written");

        Ok(json!({
            "success": true,
            "path": path,
            "bytes_written": content.len(),
            "lines": content.lines().count()
        }))
    }
}

/// Tool for listing directory contents
pub struct ListDirectoryTool {
    ctx: ToolContext,
}

impl ListDirectoryTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the entries of a directory. Recursive listings respect .gitignore."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, relative to the workspace root (default: root)"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "List subdirectories too (default: false)"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum depth for recursive listings (default: 3)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let path = args["path"].as_str().unwrap_or(".");
        let recursive = args["recursive"].as_bool().unwrap_or(false);
        let max_depth = args["max_depth"].as_u64().unwrap_or(3) as usize;
        let dir = self.ctx.resolve(path)?;

        if !dir.is_dir() {
            return Err(ToolError::NotFound(format!("Directory not found: {}", path)));
        }

        let depth = if recursive { max_depth } else { 1 };
        let mut builder = ignore::WalkBuilder::new(&dir);
        builder.max_depth(Some(depth)).hidden(false).sort_by_file_name(|a, b| a.cmp(b));

        let mut entries = Vec::new();
        for entry in builder.build().flatten() {
            // The walker yields the root itself at depth 0.
            if entry.depth() == 0 {
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let size = if is_dir {
                0
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            };
            entries.push(json!({
                "path": relative_display(&self.ctx, entry.path()),
                "is_dir": is_dir,
                "size": size
            }));
        }

        Ok(json!({
            "path": path,
            "entries": entries,
            "count": entries.len()
        }))
    }
}

/// Tool for exact string replacement inside a file
pub struct EditFileTool {
    ctx: ToolContext,
}

impl EditFileTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Replace an exact string in a file. old_string must match exactly, \
         including whitespace, and be unique unless replace_all is set."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, relative to the workspace root"
                },
                "old_string": {
                    "type": "string",
                    "description": "Exact text to replace"
                },
                "new_string": {
                    "type": "string",
                    "description": "Replacement text"
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace every occurrence (default: false)"
                }
            },
            "required": ["path", "old_string", "new_string"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let path = required_str(&args, "path")?;
        let old_string = required_str(&args, "old_string")?;
        let new_string = required_str(&args, "new_string")?;
        let replace_all = args["replace_all"].as_bool().unwrap_or(false);

        if old_string.is_empty() {
            return Err(ToolError::InvalidArguments(
                "old_string must not be empty".to_string(),
            ));
        }

        let full_path = self.ctx.resolve(path)?;
        if !full_path.is_file() {
            return Err(ToolError::NotFound(format!("File not found: {}", path)));
        }

        let content = tokio::fs::read_to_string(&full_path).await?;
        let occurrences = content.matches(old_string).count();

        match occurrences {
            0 => {
                return Err(ToolError::InvalidArguments(format!(
                    "old_string not found in {}",
                    path
                )))
            }
            n if n > 1 && !replace_all => {
                return Err(ToolError::InvalidArguments(format!(
                    "old_string found {} times in {}; pass replace_all or add context",
                    n, path
                )))
            }
            _ => {}
        }

        let updated = if replace_all {
            content.replace(old_string, new_string)
        } else {
            content.replacen(old_string, new_string, 1)
        };
        tokio::fs::write(&full_path, &updated).await?;

        Ok(json!({
            "success": true,
            "path": path,
            "replacements": if replace_all { occurrences } else { 1 }
        }))
    }
}

/// Tool for finding files by glob pattern
pub struct GlobSearchTool {
    ctx: ToolContext,
}

impl GlobSearchTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for GlobSearchTool {
    fn name(&self) -> &str {
        "glob_search"
    }

    fn description(&self) -> &str {
        "Find files whose workspace-relative path matches a glob pattern \
         such as \"**/*.rs\". Respects .gitignore."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern matched against workspace-relative paths"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search from (default: workspace root)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum matches to return (default: 100)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let pattern = required_str(&args, "pattern")?;
        let base = self.ctx.resolve(args["path"].as_str().unwrap_or("."))?;
        let max_results = args["max_results"].as_u64().unwrap_or(100) as usize;

        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| ToolError::InvalidArguments(format!("Invalid glob pattern: {}", e)))?;

        let mut builder = ignore::WalkBuilder::new(&base);
        builder.hidden(false).sort_by_file_name(|a, b| a.cmp(b));

        let mut matches = Vec::new();
        let mut truncated = false;
        for entry in builder.build().flatten() {
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let relative = relative_display(&self.ctx, entry.path());
            if matcher.matches(&relative) {
                if matches.len() >= max_results {
                    truncated = true;
                    break;
                }
                matches.push(relative);
            }
        }

        Ok(json!({
            "pattern": pattern,
            "matches": matches,
            "count": matches.len(),
            "truncated": truncated
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ToolContext) {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        (dir, ctx)
    }

    #[test]
    fn test_toolset_names() {
        let (_dir, ctx) = setup();
        assert_eq!(
            toolset(&ctx).names(),
            vec!["read_file", "write_file", "list_directory", "edit_file", "glob_search"]
        );
    }

    #[tokio::test]
    async fn test_write_then_read_window() {
        let (_dir, ctx) = setup();
        let write = WriteFileTool::new(ctx.clone());
        write
            .execute(json!({"path": "notes/a.txt", "content": "one\ntwo\nthree\n"}))
            .await
            .unwrap();

        let read = ReadFileTool::new(ctx);
        let out = read
            .execute(json!({"path": "notes/a.txt", "offset": 1, "limit": 1}))
            .await
            .unwrap();
        assert_eq!(out["content"], "two");
        assert_eq!(out["total_lines"], 3);
    }

    #[tokio::test]
    async fn test_read_refuses_large_file() {
        let (dir, mut ctx) = setup();
        ctx.max_file_size_kb = 1;
        std::fs::write(dir.path().join("big.txt"), "x".repeat(2048)).unwrap();

        let err = ReadFileTool::new(ctx)
            .execute(json!({"path": "big.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_write_outside_workspace_denied() {
        let (_dir, ctx) = setup();
        let err = WriteFileTool::new(ctx)
            .execute(json!({"path": "../escape.txt", "content": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_edit_requires_unique_match() {
        let (dir, ctx) = setup();
        std::fs::write(dir.path().join("f.txt"), "foo bar foo").unwrap();
        let edit = EditFileTool::new(ctx);

        let err = edit
            .execute(json!({"path": "f.txt", "old_string": "foo", "new_string": "baz"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let out = edit
            .execute(json!({
                "path": "f.txt",
                "old_string": "foo",
                "new_string": "baz",
                "replace_all": true
            }))
            .await
            .unwrap();
        assert_eq!(out["replacements"], 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "baz bar baz"
        );
    }

    #[tokio::test]
    async fn test_list_and_glob() {
        let (dir, ctx) = setup();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();

        let listed = ListDirectoryTool::new(ctx.clone())
            .execute(json!({}))
            .await
            .unwrap();
        assert_eq!(listed["count"], 2);

        let found = GlobSearchTool::new(ctx)
            .execute(json!({"pattern": "**/*.rs"}))
            .await
            .unwrap();
        assert_eq!(found["matches"], json!(["src/lib.rs"]));
    }
}
