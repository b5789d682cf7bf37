//! CLI module for cyro
//!
//! Argument parsing for the `cyro` binary. Uses clap for parsing and
//! owo-colors (via [`output::Output`]) for terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cyro - route coding requests to specialized subagents
///
/// Subagents are markdown files with YAML frontmatter in
/// `<config_dir>/agents/`. Each message is routed to the best match, or to
/// the built-in general-engineer agent.
#[derive(Parser, Debug)]
#[command(
    name = "cyro",
    version,
    about = "Terminal coding assistant that routes each request to the best subagent",
    after_help = "EXAMPLES:\n    \
                  cyro ask \"fix the failing test in parser.rs\"\n    \
                  cyro ask --agent code-reviewer \"review src/lib.rs\"\n    \
                  cyro ask --explain \"why is the build slow?\"\n    \
                  cyro chat\n    \
                  cyro agents --verbose"
)]
pub struct Cli {
    /// Settings file (defaults to <config_dir>/config.toml)
    #[arg(short, long, global = true, env = "CYRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to load agent definitions from
    #[arg(long, global = true)]
    pub agents_dir: Option<PathBuf>,

    /// Model to use (overrides settings)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message and print the reply
    Ask {
        /// The message to send
        message: String,

        /// Send to this agent instead of routing
        #[arg(short, long)]
        agent: Option<String>,

        /// Show which agent was chosen and why
        #[arg(short, long)]
        explain: bool,
    },

    /// Interactive session reading messages from stdin
    Chat {
        /// Send every message to this agent instead of routing
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// List registered agents (`--verbose` adds descriptions, models and tools)
    Agents,

    /// List tool categories and archetypes
    Tools,

    /// Print the effective settings as TOML
    Config,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
