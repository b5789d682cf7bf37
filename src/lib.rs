//! # cyro
//!
//! A terminal coding assistant that routes each request to the best-matching
//! subagent. Subagents are markdown files with YAML frontmatter:
//!
//! ```text
//! ---
//! name: code-reviewer
//! description: Reviews diffs for correctness and style
//! tools: filesystem, git
//! ---
//! You are a meticulous code reviewer.
//! ```
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use cyro::{CyroSettings, OpenAiCompatibleProvider, Router};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cyro::Result<()> {
//!     let settings = CyroSettings::load(None)?;
//!     let provider = Arc::new(OpenAiCompatibleProvider::new(settings.provider.clone())?);
//!     let router = Router::new(settings, provider)?;
//!
//!     let reply = router.process_request_async("why does this test flake?").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! ## Routing
//!
//! With a single registered agent every message goes straight to it. With
//! more, a selection agent picks one by id; when selection fails for any
//! reason the message goes to `general-engineer`, which is synthesized at
//! load time if no general-purpose agent was defined.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `git-tools` | `git` tool category (default) |
//! | `code-tools` | `code` tool category, Python execution (default) |
//!
//! ## Modules
//!
//! - [`agents`] - agent definitions, handles, registry and router
//! - [`llm`] - model caller abstractions and the OpenAI-compatible client
//! - [`tools`] - tool category composition
//! - [`types`] - error handling
//! - [`utils`] - layered settings

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Agent definitions, registry and routing.
pub mod agents;
/// Command-line parsing and output.
pub mod cli;
/// Model caller abstractions and clients.
pub mod llm;
/// Tool category composition.
pub mod tools;
/// Errors and result alias.
pub mod types;
/// Settings loading.
pub mod utils;

// Re-export commonly used types
pub use agents::{
    AgentConfig, AgentHandle, AgentMetadata, AgentRegistry, AgentSelection, Route, RoutePath,
    Router, RouterBuilder, RoutingFailure,
};
pub use llm::{
    ModelCaller, ModelProvider, ModelRequest, OpenAiCompatibleClient, OpenAiCompatibleProvider,
    OutputSchema,
};
pub use tools::ToolFactory;
pub use types::{AgentLookup, CyroError, Result};
pub use utils::settings::CyroSettings;
