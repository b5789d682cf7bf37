//! Agent definition parsing
//!
//! An agent is a markdown file whose YAML frontmatter carries its metadata
//! and whose body is its system prompt:
//!
//! ```text
//! ---
//! name: code-reviewer
//! description: Reviews diffs for correctness and style
//! version: "1.2"
//! tools: filesystem, git
//! model: qwen2.5-coder:14b
//! ---
//! You are a meticulous code reviewer...
//! ```

use crate::llm::OutputSchema;
use crate::types::{CyroError, Result};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::sync::LazyLock;

/// Version used when the frontmatter has none
pub const DEFAULT_VERSION: &str = "1.0";

static FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---\n(.*?)\n---\n(.*)\z").expect("frontmatter pattern is valid")
});

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\.[0-9]$").expect("version pattern is valid"));

/// Identity of an agent definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentMetadata {
    name: String,
    description: String,
    version: String,
}

impl AgentMetadata {
    /// Build metadata, rejecting versions that are not `<1-9>.<0-9>`
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let version = version.into();
        if !VERSION.is_match(&version) {
            return Err(CyroError::InvalidMetadata(format!(
                "version '{}' must look like '1.0' (single-digit major.minor)",
                version
            )));
        }
        Ok(Self {
            name: name.into(),
            description: description.into(),
            version,
        })
    }

    /// Metadata for built-in agents, whose version is known to be valid
    pub(crate) fn builtin(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Parsed agent definition
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub metadata: AgentMetadata,
    /// Trimmed markdown body
    pub system_prompt: String,
    pub instructions: Option<String>,
    /// Declared tool categories, in declaration order
    pub tools: Option<Vec<String>>,
    /// Schema responses must follow; free text when `None`
    pub result_type: Option<OutputSchema>,
    pub color: Option<String>,
    /// Model override for this agent
    pub model: Option<String>,
}

impl AgentConfig {
    /// Parse a markdown definition (`&str`, `String` or raw bytes)
    pub fn from_markdown(
        content: impl AsRef<[u8]>,
        result_type: Option<OutputSchema>,
    ) -> Result<Self> {
        parse(content, result_type)
    }

    /// Read and parse a markdown definition from disk
    pub fn from_file(path: impl AsRef<Path>, result_type: Option<OutputSchema>) -> Result<Self> {
        parse_file(path, result_type)
    }
}

/// Parse markdown with YAML frontmatter into an [`AgentConfig`].
///
/// # Errors
///
/// - [`CyroError::MalformedDocument`] when the content is not UTF-8, has no
///   `---` delimited frontmatter, or the frontmatter is not a mapping
/// - [`CyroError::FrontmatterSyntax`] when the frontmatter is not valid YAML
/// - [`CyroError::MissingField`] when `name` or `description` is absent or null
/// - [`CyroError::InvalidMetadata`] when `version` does not match `^[1-9]\.[0-9]$`
pub fn parse(content: impl AsRef<[u8]>, result_type: Option<OutputSchema>) -> Result<AgentConfig> {
    let text = std::str::from_utf8(content.as_ref())
        .map_err(|e| CyroError::MalformedDocument(format!("content is not valid UTF-8: {}", e)))?;
    let text = text.replace("\r\n", "\n");

    let captures = FRONTMATTER.captures(&text).ok_or_else(|| {
        CyroError::MalformedDocument("missing YAML frontmatter delimited by '---' lines".into())
    })?;
    let frontmatter = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let fields = match serde_yaml::from_str::<Value>(frontmatter)? {
        Value::Mapping(map) => map,
        other => {
            return Err(CyroError::MalformedDocument(format!(
                "frontmatter must be a mapping, found {}",
                kind(&other)
            )))
        }
    };

    let name = field(&fields, "name").ok_or(CyroError::MissingField("name"))?;
    let description = field(&fields, "description").ok_or(CyroError::MissingField("description"))?;
    let version = field(&fields, "version").unwrap_or_else(|| DEFAULT_VERSION.to_string());

    Ok(AgentConfig {
        metadata: AgentMetadata::new(name, description, version)?,
        system_prompt: body.trim().to_string(),
        instructions: field(&fields, "instructions"),
        tools: fields.get("tools").and_then(normalize_tools),
        result_type,
        color: field(&fields, "color"),
        model: field(&fields, "model"),
    })
}

/// Read `path` and [`parse`] it
pub fn parse_file(path: impl AsRef<Path>, result_type: Option<OutputSchema>) -> Result<AgentConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CyroError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read(path)?;
    parse(content, result_type)
}

/// A scalar field as a string; `None` when absent or null
fn field(fields: &Mapping, key: &str) -> Option<String> {
    fields.get(key).and_then(stringify)
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => stringify(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(value)
            .ok()
            .map(|s| s.trim_end().to_string()),
    }
}

/// `"a, b , c"` and `[a, b, c]` both become `["a", "b", "c"]`
fn normalize_tools(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        ),
        Value::Sequence(items) => Some(items.iter().filter_map(stringify).collect()),
        other => stringify(other).map(|s| vec![s]),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
