//! Subagents: definitions, handles, registry and routing
//!
//! - [`config`] - parse markdown + YAML frontmatter agent definitions
//! - [`handle`] - an agent bound to its model caller and tools
//! - [`registry`] - insertion-ordered, id-keyed store of handles
//! - [`router`] - load a directory of agents and route messages among them
//! - [`prompts`] - selection agent prompts

pub mod config;
pub mod handle;
pub mod prompts;
pub mod registry;
pub mod router;

pub use config::{AgentConfig, AgentMetadata};
pub use handle::{make_general_agent, AgentHandle, DEFAULT_AGENT_NAME, DEFAULT_AGENT_SYNONYMS};
pub use registry::AgentRegistry;
pub use router::{
    AgentSelection, LoadReport, Route, RoutePath, Router, RouterBuilder, RoutingFailure,
    Selection, SkippedAgent,
};
