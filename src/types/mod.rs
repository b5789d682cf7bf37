use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

// ============= Lookup Keys =============

/// How an agent was looked up, carried by [`CyroError::AgentNotFound`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentLookup {
    Id(Uuid),
    Name(String),
}

impl fmt::Display for AgentLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentLookup::Id(id) => write!(f, "id {}", id),
            AgentLookup::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum CyroError {
    #[error("Malformed agent document: {0}")]
    MalformedDocument(String),

    #[error("Invalid YAML frontmatter: {0}")]
    FrontmatterSyntax(#[from] serde_yaml::Error),

    #[error("Missing required field '{0}' in frontmatter")]
    MissingField(&'static str),

    #[error("Invalid agent metadata: {0}")]
    InvalidMetadata(String),

    #[error("Agent file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No agent with {0}")]
    AgentNotFound(AgentLookup),

    #[error("Unknown tool '{name}'. Available tools: [{}]", .available.join(", "))]
    UnknownTool { name: String, available: Vec<String> },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Tool error: {0}")]
    Tool(#[from] cyro_tools::ToolError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CyroError {
    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CyroError::Config(_) => 2,
            CyroError::MalformedDocument(_)
            | CyroError::FrontmatterSyntax(_)
            | CyroError::MissingField(_)
            | CyroError::InvalidMetadata(_)
            | CyroError::FileNotFound(_)
            | CyroError::AgentNotFound(_)
            | CyroError::UnknownTool { .. } => 3,
            CyroError::Model(_) | CyroError::Timeout(_) => 4,
            CyroError::Io(_) | CyroError::Tool(_) | CyroError::Runtime(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CyroError>;
