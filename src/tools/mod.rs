//! Tool composition for agents
//!
//! Agents declare the tool *categories* they need (`tools: filesystem, git`)
//! and [`ToolFactory`] turns those names into a [`ToolBundle`] of concrete
//! tools from the `cyro-tools` crate.
//!
//! # Categories
//!
//! | Category | Tools |
//! |----------|-------|
//! | `filesystem` | `read_file`, `write_file`, `list_directory`, `edit_file`, `glob_search` |
//! | `execution` | `run_command` |
//! | `web` | `web_fetch` |
//! | `task_management` | `todo_write`, `query_tasks` |
//! | `git` (feature `git-tools`) | `git_status`, `git_diff`, `git_log`, `git_commit` |
//! | `code` (feature `code-tools`) | `execute_python` |
//!
//! Archetypes (`general`, `coding`, `debug`, `file`, `web`, `search`,
//! `manager`) name common category combinations.

pub mod factory;

pub use cyro_tools::{Tool, ToolBundle, ToolContext, ToolDefinition};
pub use factory::ToolFactory;
