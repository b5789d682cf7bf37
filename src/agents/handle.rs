//! A parsed agent bound to a model and its tools

use crate::agents::config::{AgentConfig, AgentMetadata};
use crate::llm::{ModelCaller, ModelRequest};
use crate::types::{CyroError, Result};
use cyro_tools::ToolBundle;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the agent synthesized when no general-purpose agent is loaded
pub const DEFAULT_AGENT_NAME: &str = "general-engineer";

/// Names accepted as the general-purpose agent, in lookup order
pub const DEFAULT_AGENT_SYNONYMS: &[&str] = &[DEFAULT_AGENT_NAME, "engineer", "software-engineer"];

const DEFAULT_AGENT_DESCRIPTION: &str = "General-purpose software engineering agent for coding tasks, \
debugging, refactoring, and technical problem-solving. Not an expert in any one task but has \
knowledge of most things.";

const DEFAULT_AGENT_PROMPT: &str = "You are a helpful assistant";

/// Identity, configuration and model binding of one agent.
///
/// The id is a fresh v4 UUID per construction, so two handles built from the
/// same file are still distinct agents.
pub struct AgentHandle {
    id: Uuid,
    config: AgentConfig,
    tools: ToolBundle,
    caller: Arc<dyn ModelCaller>,
}

impl AgentHandle {
    pub fn new(config: AgentConfig, caller: Arc<dyn ModelCaller>, tools: ToolBundle) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            tools,
            caller,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn metadata(&self) -> &AgentMetadata {
        &self.config.metadata
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolBundle {
        &self.tools
    }

    /// Model this agent runs on
    pub fn model_name(&self) -> &str {
        self.caller.model_name()
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ModelRequest<'a> {
        ModelRequest {
            system_prompt: &self.config.system_prompt,
            instructions: self.config.instructions.as_deref(),
            user_prompt: prompt,
            tools: &self.tools,
        }
    }

    /// Answer `prompt`; structured agents answer with their JSON rendered as text
    pub async fn respond_async(&self, prompt: &str) -> Result<String> {
        match &self.config.result_type {
            Some(schema) => {
                let value = self
                    .caller
                    .generate_structured(&self.request(prompt), schema)
                    .await?;
                Ok(value.to_string())
            }
            None => self.caller.generate(&self.request(prompt)).await,
        }
    }

    /// Answer `prompt` constrained to this agent's result type
    pub async fn respond_structured_async(&self, prompt: &str) -> Result<Value> {
        let schema = self.config.result_type.as_ref().ok_or_else(|| {
            CyroError::Model(format!(
                "Agent '{}' has no result type",
                self.metadata().name()
            ))
        })?;
        self.caller
            .generate_structured(&self.request(prompt), schema)
            .await
    }

    /// Blocking [`AgentHandle::respond_async`].
    ///
    /// Runs on a private current-thread runtime, so it must not be called
    /// from async code; doing so returns [`CyroError::Runtime`].
    pub fn respond(&self, prompt: &str) -> Result<String> {
        block_on(self.respond_async(prompt))?
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id)
            .field("name", &self.metadata().name())
            .field("model", &self.caller.model_name())
            .field("tools", &self.tools.names())
            .finish()
    }
}

/// Drive `future` to completion on a fresh current-thread runtime
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(CyroError::Runtime(
            "blocking call made from inside an async runtime; use the async variant".into(),
        ));
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Configuration of the built-in general-purpose agent
pub fn general_agent_config() -> AgentConfig {
    AgentConfig {
        metadata: AgentMetadata::builtin(DEFAULT_AGENT_NAME, DEFAULT_AGENT_DESCRIPTION),
        system_prompt: DEFAULT_AGENT_PROMPT.to_string(),
        instructions: None,
        tools: None,
        result_type: None,
        color: None,
        model: None,
    }
}

/// Synthesize the canonical default agent
pub fn make_general_agent(caller: Arc<dyn ModelCaller>, tools: ToolBundle) -> AgentHandle {
    AgentHandle::new(general_agent_config(), caller, tools)
}

/// Whether `name` is one of the general-purpose agent names
pub fn is_default_agent_name(name: &str) -> bool {
    let name = name.to_lowercase();
    DEFAULT_AGENT_SYNONYMS.iter().any(|n| *n == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OutputSchema;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ModelCaller for Echo {
        async fn generate(&self, request: &ModelRequest<'_>) -> Result<String> {
            Ok(format!("{}|{}", request.system_prompt, request.user_prompt))
        }

        async fn generate_structured(
            &self,
            request: &ModelRequest<'_>,
            schema: &OutputSchema,
        ) -> Result<Value> {
            Ok(json!({"schema": schema.name, "prompt": request.user_prompt}))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn structured_config() -> AgentConfig {
        AgentConfig {
            result_type: Some(OutputSchema::new("Verdict", json!({"type": "object"}))),
            ..general_agent_config()
        }
    }

    #[test]
    fn test_ids_are_unique_per_construction() {
        let a = make_general_agent(Arc::new(Echo), ToolBundle::new());
        let b = make_general_agent(Arc::new(Echo), ToolBundle::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.metadata().name(), DEFAULT_AGENT_NAME);
        assert_eq!(a.model_name(), "echo");
    }

    #[test]
    fn test_respond_blocking_free_text() {
        let agent = make_general_agent(Arc::new(Echo), ToolBundle::new());
        let reply = agent.respond("hi").unwrap();
        assert_eq!(reply, "You are a helpful assistant|hi");
    }

    #[tokio::test]
    async fn test_structured_reply_is_json_text() {
        let agent = AgentHandle::new(structured_config(), Arc::new(Echo), ToolBundle::new());
        let text = agent.respond_async("pick").await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["schema"], "Verdict");

        let value = agent.respond_structured_async("pick").await.unwrap();
        assert_eq!(value["prompt"], "pick");
    }

    #[tokio::test]
    async fn test_structured_without_result_type() {
        let agent = make_general_agent(Arc::new(Echo), ToolBundle::new());
        let err = agent.respond_structured_async("x").await.unwrap_err();
        assert!(matches!(err, CyroError::Model(_)));
    }

    #[tokio::test]
    async fn test_respond_inside_runtime_is_an_error() {
        let agent = make_general_agent(Arc::new(Echo), ToolBundle::new());
        assert!(matches!(agent.respond("hi"), Err(CyroError::Runtime(_))));
    }

    #[test]
    fn test_default_names() {
        assert!(is_default_agent_name("Software-Engineer"));
        assert!(is_default_agent_name("ENGINEER"));
        assert!(!is_default_agent_name("code-reviewer"));
    }
}
