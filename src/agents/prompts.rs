//! Prompts for the selection agent

use crate::agents::handle::DEFAULT_AGENT_NAME;
use crate::agents::registry::AgentRegistry;
use std::fmt::Write;

/// Name the selection agent runs under; never registered
pub const SELECTOR_NAME: &str = "manager";

pub const SELECTOR_DESCRIPTION: &str = "Responsible for delegating tasks to subagents";

/// System prompt of the selection agent
pub const SELECTOR_SYSTEM_PROMPT: &str = r#"You are a Manager Agent. You read a user's request and decide which specialized agent should handle it. You do not answer the request yourself.

## What you do
- Work out what the user is trying to achieve: the action, the technical domain and how much work it involves.
- Compare that against the description and tools of every available agent.
- Pick exactly one agent and explain the choice in one or two sentences.

## What you do NOT do
- Do not solve the task, write code or answer questions directly.
- Do not ask clarifying questions. Decide with the information you have.
- Do not invent agents or ids. Only choose from the list you are given.

## Defaults
When no specialized agent is clearly a better fit, choose the general-purpose software engineer.

## Response
Reply with a single JSON object and nothing else."#;

/// Render the selection instructions for the agents currently in `registry`.
///
/// Rebuilt from scratch whenever the registry changes, so the listing always
/// matches what the router can resolve.
pub fn render_instructions(registry: &AgentRegistry) -> String {
    let mut out = String::from(
        "## Agent Selection\n\n\
         Pick the single best agent for the request.\n\n\
         1. Identify the primary action (create, debug, review, modify, deploy, explain).\n\
         2. Identify the technical domain (frontend, backend, data, devops, security, testing).\n\
         3. Judge the scope (one file, several files, architectural).\n\
         4. Score each agent 0-10: domain expertise (0-4), tool availability (0-3), scope match (0-3).\n\n\
         ### Available Agents\n\n",
    );

    for agent in registry {
        let meta = agent.metadata();
        let _ = writeln!(out, "**{}** (ID: {})", meta.name(), agent.id());
        let _ = writeln!(out, "- Description: {}", meta.description());
        let _ = writeln!(out, "- Version: {}", meta.version());
        if let Some(tools) = agent.config().tools.as_ref().filter(|t| !t.is_empty()) {
            let _ = writeln!(out, "- Tools: {}", tools.join(", "));
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "### Decision Rules\n\n\
         1. A specialist scoring 8 or more beats the generalist.\n\
         2. The agent must have the tools the request needs (filesystem, git, web, ...).\n\
         3. When scores are within one point, or nothing fits, choose `{default}`.\n\n\
         ### Response Format\n\n\
         ```json\n\
         {{\n  \
         \"recommended_agent\": \"<exact agent name from the list>\",\n  \
         \"agent_id\": \"<the ID shown next to that name>\",\n  \
         \"reasoning\": \"<action, domain and scope, and why this agent fits>\"\n\
         }}\n\
         ```\n\n\
         `agent_id` must be copied exactly from the listing above.\n",
        default = DEFAULT_AGENT_NAME
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::AgentConfig;
    use crate::agents::handle::AgentHandle;
    use crate::llm::{ModelCaller, ModelRequest, OutputSchema};
    use crate::types::Result;
    use async_trait::async_trait;
    use cyro_tools::ToolBundle;
    use serde_json::Value;
    use std::sync::Arc;

    struct Silent;

    #[async_trait]
    impl ModelCaller for Silent {
        async fn generate(&self, _request: &ModelRequest<'_>) -> Result<String> {
            Ok(String::new())
        }

        async fn generate_structured(
            &self,
            _request: &ModelRequest<'_>,
            _schema: &OutputSchema,
        ) -> Result<Value> {
            Ok(Value::Null)
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    #[test]
    fn test_listing_contains_every_agent() {
        let mut registry = AgentRegistry::new();
        let config = AgentConfig::from_markdown(
            "---\nname: code-reviewer\ndescription: reviews code\nversion: \"1.3\"\ntools: git, filesystem\n---\nReview.",
            None,
        )
        .unwrap();
        let reviewer = Arc::new(AgentHandle::new(config, Arc::new(Silent), ToolBundle::new()));
        registry.add(Arc::clone(&reviewer));

        let text = render_instructions(&registry);
        assert!(text.contains(&format!("**code-reviewer** (ID: {})", reviewer.id())));
        assert!(text.contains("- Description: reviews code"));
        assert!(text.contains("- Version: 1.3"));
        assert!(text.contains("- Tools: git, filesystem"));
        assert!(text.contains("`general-engineer`"));
    }

    #[test]
    fn test_empty_registry_still_renders_rules() {
        let text = render_instructions(&AgentRegistry::new());
        assert!(text.contains("### Available Agents"));
        assert!(text.contains("\"agent_id\""));
    }
}
