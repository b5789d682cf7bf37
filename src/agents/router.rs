//! Routes each message to the best registered agent
//!
//! The router owns an [`AgentRegistry`] and a separate selection agent
//! (`manager`) that is never part of the registry. For every message:
//!
//! 1. a registry holding a single agent answers directly, without a model call
//! 2. otherwise the selection agent picks an agent by id, bounded by the
//!    selection timeout
//! 3. any selection failure (model error, timeout, unparseable output, an id
//!    that is not registered) falls back to the general-purpose agent
//!
//! The chosen agent's reply, or its error, is returned unchanged.

use crate::agents::config::{self, AgentConfig, AgentMetadata};
use crate::agents::handle::{
    block_on, is_default_agent_name, make_general_agent, AgentHandle, DEFAULT_AGENT_NAME,
};
use crate::agents::prompts::{
    render_instructions, SELECTOR_DESCRIPTION, SELECTOR_NAME, SELECTOR_SYSTEM_PROMPT,
};
use crate::agents::registry::AgentRegistry;
use crate::llm::{ModelProvider, OutputSchema};
use crate::tools::ToolFactory;
use crate::types::{AgentLookup, CyroError, Result};
use crate::utils::settings::CyroSettings;
use cyro_tools::ToolBundle;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============= Routing Outcomes =============

/// The selection agent's structured answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AgentSelection {
    /// Name of the chosen agent, as listed in the instructions
    pub recommended_agent: String,
    /// Id of the chosen agent, copied from the instructions
    pub agent_id: Uuid,
    /// Why this agent fits the request
    pub reasoning: String,
}

/// Why a selection did not produce a registered agent
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingFailure {
    #[error("selection call failed: {0}")]
    Model(String),

    #[error("selection timed out after {0:?}")]
    Timeout(Duration),

    #[error("selection output is not a valid agent selection: {0}")]
    InvalidSelection(String),

    #[error("selection named unregistered agent id {0}")]
    UnknownAgent(Uuid),
}

/// Result of asking the selection agent
#[derive(Debug)]
pub enum Selection {
    Selected {
        agent: Arc<AgentHandle>,
        selection: AgentSelection,
    },
    Failed(RoutingFailure),
}

/// How a message reached its agent
#[derive(Debug, Clone, PartialEq)]
pub enum RoutePath {
    /// Only one agent is registered; no model call was made
    Shortcut,
    Selected(AgentSelection),
    /// Selection failed and the general-purpose agent was used
    Fallback(RoutingFailure),
}

/// Routing decision for one message
#[derive(Debug, Clone)]
pub struct Route {
    pub agent: Arc<AgentHandle>,
    pub path: RoutePath,
}

// ============= Load Report =============

/// An agent file that could not be loaded
#[derive(Debug)]
pub struct SkippedAgent {
    pub path: PathBuf,
    pub error: CyroError,
}

/// What happened while loading the agents directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names of the agents loaded from files, in load order
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedAgent>,
    /// Whether `general-engineer` had to be synthesized
    pub synthesized_default: bool,
}

// ============= Builder =============

/// Configures and builds a [`Router`].
///
/// ```ignore
/// let provider = Arc::new(OpenAiCompatibleProvider::new(settings.provider.clone())?);
/// let router = RouterBuilder::new(settings, provider)
///     .agents_dir("./agents")
///     .build()?;
/// ```
pub struct RouterBuilder {
    settings: CyroSettings,
    provider: Arc<dyn ModelProvider>,
    factory: Option<ToolFactory>,
    agents_dir: Option<PathBuf>,
    selection_timeout: Option<Duration>,
}

impl RouterBuilder {
    pub fn new(settings: CyroSettings, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            settings,
            provider,
            factory: None,
            agents_dir: None,
            selection_timeout: None,
        }
    }

    /// Use `factory` instead of one built from the settings' tool context
    pub fn tool_factory(mut self, factory: ToolFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Scan `dir` instead of `<config_dir>/agents`
    pub fn agents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.agents_dir = Some(dir.into());
        self
    }

    pub fn selection_timeout(mut self, timeout: Duration) -> Self {
        self.selection_timeout = Some(timeout);
        self
    }

    /// Load every agent, guarantee the default agent and build the selector
    pub fn build(self) -> Result<Router> {
        let factory = self
            .factory
            .unwrap_or_else(|| ToolFactory::new(self.settings.tool_context()));
        let agents_dir = self
            .agents_dir
            .unwrap_or_else(|| self.settings.agents_dir());
        let selection_timeout = self
            .selection_timeout
            .unwrap_or_else(|| self.settings.routing.selection_timeout());

        let mut registry = AgentRegistry::new();
        let mut report = LoadReport::default();

        for path in agent_files(&agents_dir) {
            match load_agent(&path, self.provider.as_ref(), &factory) {
                Ok(handle) => {
                    debug!(path = %path.display(), agent = handle.metadata().name(), id = %handle.id(), "Loaded agent");
                    report.loaded.push(handle.metadata().name().to_string());
                    registry.add(Arc::new(handle));
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "Skipping agent file");
                    report.skipped.push(SkippedAgent { path, error });
                }
            }
        }

        if !registry.iter().any(|a| is_default_agent_name(a.metadata().name())) {
            let general = make_general_agent(self.provider.caller(None)?, ToolBundle::new());
            debug!(id = %general.id(), "Synthesized {}", DEFAULT_AGENT_NAME);
            registry.add(Arc::new(general));
            report.synthesized_default = true;
        }

        let selector = build_selector(self.provider.as_ref(), &factory, &registry)?;

        info!(
            dir = %agents_dir.display(),
            agents = ?registry.names(),
            skipped = report.skipped.len(),
            "Agents loaded"
        );

        Ok(Router {
            registry,
            selector,
            provider: self.provider,
            factory,
            selection_timeout,
            report,
        })
    }
}

/// `*.md` regular files directly inside `dir`, sorted by file name.
///
/// A directory that is missing or cannot be read yields nothing, and
/// unreadable entries are skipped; both are logged.
fn agent_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "Agents directory does not exist");
            return Vec::new();
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot read agents directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

fn load_agent(path: &Path, provider: &dyn ModelProvider, factory: &ToolFactory) -> Result<AgentHandle> {
    let config = config::parse_file(path, None)?;
    let tools = match &config.tools {
        Some(categories) => factory.build(categories)?,
        None => ToolBundle::new(),
    };
    let caller = provider.caller(config.model.as_deref())?;
    Ok(AgentHandle::new(config, caller, tools))
}

fn build_selector(
    provider: &dyn ModelProvider,
    factory: &ToolFactory,
    registry: &AgentRegistry,
) -> Result<AgentHandle> {
    let config = AgentConfig {
        metadata: AgentMetadata::builtin(SELECTOR_NAME, SELECTOR_DESCRIPTION),
        system_prompt: SELECTOR_SYSTEM_PROMPT.to_string(),
        instructions: Some(render_instructions(registry)),
        tools: None,
        result_type: Some(OutputSchema::of::<AgentSelection>()),
        color: None,
        model: None,
    };
    let tools = factory.resolve_bundle_for_archetype(SELECTOR_NAME)?;
    Ok(AgentHandle::new(config, provider.caller(None)?, tools))
}

// ============= Router =============

/// Registry plus selection agent
pub struct Router {
    registry: AgentRegistry,
    selector: AgentHandle,
    provider: Arc<dyn ModelProvider>,
    factory: ToolFactory,
    selection_timeout: Duration,
    report: LoadReport,
}

impl Router {
    /// Build a router from `settings`, scanning `<config_dir>/agents`
    pub fn new(settings: CyroSettings, provider: Arc<dyn ModelProvider>) -> Result<Self> {
        RouterBuilder::new(settings, provider).build()
    }

    pub fn builder(settings: CyroSettings, provider: Arc<dyn ModelProvider>) -> RouterBuilder {
        RouterBuilder::new(settings, provider)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// The selection agent
    pub fn selector(&self) -> &AgentHandle {
        &self.selector
    }

    /// Routing instructions as currently rendered for the selector
    pub fn instructions(&self) -> &str {
        self.selector
            .config()
            .instructions
            .as_deref()
            .unwrap_or_default()
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    pub fn tool_factory(&self) -> &ToolFactory {
        &self.factory
    }

    pub fn get_agent_by_name(&self, name: &str) -> Result<Arc<AgentHandle>> {
        self.registry.get_by_name(name)
    }

    pub fn get_agent_by_id(&self, id: &Uuid) -> Result<Arc<AgentHandle>> {
        self.registry.get_by_id(id)
    }

    /// Register `handle` and rebuild the selector so it can pick it.
    ///
    /// Returns `false` without touching the selector when the id is
    /// already registered.
    pub fn register(&mut self, handle: Arc<AgentHandle>) -> Result<bool> {
        if !self.registry.add(handle) {
            return Ok(false);
        }
        self.selector = build_selector(self.provider.as_ref(), &self.factory, &self.registry)?;
        Ok(true)
    }

    /// The general-purpose agent: the earliest registered agent named
    /// `general-engineer`, `engineer` or `software-engineer`
    pub fn default_agent(&self) -> Result<Arc<AgentHandle>> {
        self.registry
            .iter()
            .find(|a| is_default_agent_name(a.metadata().name()))
            .cloned()
            .ok_or_else(|| CyroError::AgentNotFound(AgentLookup::Name(DEFAULT_AGENT_NAME.to_string())))
    }

    /// Ask the selection agent for an agent, without falling back
    pub async fn select(&self, message: &str) -> Selection {
        let call = self.selector.respond_structured_async(message);
        let value = match tokio::time::timeout(self.selection_timeout, call).await {
            Err(_) => return Selection::Failed(RoutingFailure::Timeout(self.selection_timeout)),
            Ok(Err(CyroError::Timeout(after))) => {
                return Selection::Failed(RoutingFailure::Timeout(after))
            }
            Ok(Err(e)) => return Selection::Failed(RoutingFailure::Model(e.to_string())),
            Ok(Ok(value)) => value,
        };

        let selection: AgentSelection = match serde_json::from_value(value) {
            Ok(selection) => selection,
            Err(e) => return Selection::Failed(RoutingFailure::InvalidSelection(e.to_string())),
        };

        match self.registry.get_by_id(&selection.agent_id) {
            Ok(agent) => Selection::Selected { agent, selection },
            Err(_) => Selection::Failed(RoutingFailure::UnknownAgent(selection.agent_id)),
        }
    }

    /// Decide which agent answers `message`
    pub async fn route(&self, message: &str) -> Result<Route> {
        if self.registry.len() == 1 {
            if let Some(agent) = self.registry.iter().next() {
                debug!(agent = agent.metadata().name(), "Single agent registered, skipping selection");
                return Ok(Route {
                    agent: Arc::clone(agent),
                    path: RoutePath::Shortcut,
                });
            }
        }

        match self.select(message).await {
            Selection::Selected { agent, selection } => {
                info!(
                    agent = agent.metadata().name(),
                    reasoning = %selection.reasoning,
                    "Routing message"
                );
                Ok(Route {
                    agent,
                    path: RoutePath::Selected(selection),
                })
            }
            Selection::Failed(reason) => {
                let agent = self.default_agent()?;
                warn!(%reason, fallback = agent.metadata().name(), "Routing failed, using default agent");
                Ok(Route {
                    agent,
                    path: RoutePath::Fallback(reason),
                })
            }
        }
    }

    /// Route `message` and return the chosen agent's reply
    pub async fn process_request_async(&self, message: &str) -> Result<String> {
        let route = self.route(message).await?;
        route.agent.respond_async(message).await
    }

    /// Blocking [`Router::process_request_async`]; returns
    /// [`CyroError::Runtime`] when called from async code
    pub fn process_request(&self, message: &str) -> Result<String> {
        block_on(self.process_request_async(message))?
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("agents", &self.registry.names())
            .field("selection_timeout", &self.selection_timeout)
            .finish()
    }
}
