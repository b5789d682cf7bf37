//! # cyro-tools
//!
//! Capability tools that Cyro subagents can be equipped with. Tools are
//! grouped into categories, each exposed as a `toolset` builder returning a
//! [`ToolBundle`]:
//!
//! - [`filesystem`] - read, write, list, edit and glob files under the workspace root
//! - [`execution`] - run shell commands with a timeout and a sandbox denylist
//! - [`web`] - fetch web pages and reduce them to text
//! - [`git`] - status, diff, log and commit (feature `git`)
//! - [`code`] - execute Python snippets (feature `code`)
//! - [`tasks`] - in-memory todo tracking shared across an agent's calls
//!
//! The bundle is what an agent hands to its model caller: definitions go to
//! the model, requested calls come back through [`ToolBundle::execute`].

pub mod execution;
pub mod filesystem;
mod process;
pub mod tasks;
pub mod web;

#[cfg(feature = "code")]
pub mod code;

#[cfg(feature = "git")]
pub mod git;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Error types for tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type alias for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Default timeout for shell commands (in seconds)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default maximum readable file size (in KB)
pub const DEFAULT_MAX_FILE_SIZE_KB: u64 = 10 * 1024;

/// Tool definition handed to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: Value,
}

/// Trait for implementing tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of this tool
    fn name(&self) -> &str;

    /// Returns a description of what this tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for this tool's parameters
    fn parameters_schema(&self) -> Value;

    /// Executes the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value>;

    /// Convert to ToolDefinition
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Settings shared by every toolset builder.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Root directory file and process tools operate in
    pub workspace_root: PathBuf,
    /// Timeout applied to spawned commands
    pub command_timeout: Duration,
    /// Reject dangerous shell commands unless explicitly allowed
    pub sandbox_mode: bool,
    /// Files larger than this are refused by read tools
    pub max_file_size_kb: u64,
    /// Categories whose sandbox checks a tool call cannot waive by itself
    pub require_approval: Vec<String>,
}

impl ToolContext {
    /// Create a context rooted at `workspace_root` with default limits
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            sandbox_mode: true,
            max_file_size_kb: DEFAULT_MAX_FILE_SIZE_KB,
            require_approval: Vec::new(),
        }
    }

    /// Whether calls in `category` need approval outside the model's control
    pub fn requires_approval(&self, category: &str) -> bool {
        self.require_approval.iter().any(|c| c == category)
    }

    /// Resolve `path` against the workspace root, refusing anything that escapes it.
    ///
    /// The check is lexical: `..` components are folded before comparing, so
    /// paths to files that do not exist yet (for `write_file`) resolve too.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let candidate = Path::new(path);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workspace_root.join(candidate)
        };

        let normalized = normalize(&joined);
        let root = normalize(&self.workspace_root);
        if !normalized.starts_with(&root) {
            return Err(ToolError::PermissionDenied(format!(
                "{} is outside the workspace root {}",
                path,
                self.workspace_root.display()
            )));
        }
        Ok(normalized)
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// An ordered collection of tools.
///
/// Order is the order tools were added. Names are not deduplicated: when two
/// categories contribute a tool with the same name both entries are kept and
/// lookups resolve to the first one.
#[derive(Clone, Default)]
pub struct ToolBundle {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Add a tool at the end of the bundle
    pub fn push(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Builder-style variant of [`ToolBundle::push`]
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.push(tool);
        self
    }

    /// Append every tool of `other`, keeping its order
    pub fn extend(&mut self, other: ToolBundle) {
        self.tools.extend(other.tools);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in bundle order, duplicates included
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// First tool registered under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Definitions for every tool, in bundle order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        match self.get(name) {
            Some(tool) => tool.execute(args).await,
            None => Err(ToolError::NotFound(format!("Tool not found: {}", name))),
        }
    }
}

impl std::fmt::Debug for ToolBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBundle")
            .field("tools", &self.names())
            .finish()
    }
}

/// Pull a required string argument out of a tool call
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("{} is required", key)))
}

/// Cut `text` to at most `max` bytes on a char boundary, noting the original size
pub(crate) fn truncate(text: String, max: usize) -> (String, bool) {
    if text.len() <= max {
        return (text, false);
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let total = text.len();
    (
        format!("{}...[truncated, {} bytes total]", &text[..end], total),
        true,
    )
}
