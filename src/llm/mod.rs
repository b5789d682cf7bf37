//! Model-calling abstractions
//!
//! Agents never talk to a concrete provider. They hold an
//! `Arc<dyn ModelCaller>` obtained from a [`ModelProvider`], which lets tests
//! swap in stubs and lets each agent override the model it runs on.
//!
//! - [`ModelCaller`] - free-text and schema-constrained generation
//! - [`ModelProvider`] - hands out callers, optionally for a specific model
//! - [`openai`] - a `reqwest` client for OpenAI-compatible `/chat/completions`
//!   endpoints (Ollama, vLLM, OpenRouter, OpenAI itself)

pub mod openai;

use crate::types::Result;
use async_trait::async_trait;
use cyro_tools::ToolBundle;
use schemars::JsonSchema;
use serde_json::Value;
use std::sync::Arc;

pub use openai::{OpenAiCompatibleClient, OpenAiCompatibleProvider};

/// Everything a single model call needs
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system_prompt: &'a str,
    pub instructions: Option<&'a str>,
    pub user_prompt: &'a str,
    /// Tools the model may call while answering; empty for plain completions
    pub tools: &'a ToolBundle,
}

/// A named JSON schema a structured response must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Derive the schema of a Rust type
    pub fn of<T: JsonSchema>() -> Self {
        Self {
            name: T::schema_name().into_owned(),
            schema: schemars::schema_for!(T).to_value(),
        }
    }
}

/// Opaque model-calling capability bound to one model
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Unconstrained text generation
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String>;

    /// Generation constrained to `schema`, returned as parsed JSON
    async fn generate_structured(
        &self,
        request: &ModelRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Factory for model callers
pub trait ModelProvider: Send + Sync {
    /// A caller for `model`, or for the provider's default model when `None`
    fn caller(&self, model: Option<&str>) -> Result<Arc<dyn ModelCaller>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Verdict {
        approved: bool,
        comment: String,
    }

    #[test]
    fn test_output_schema_of_type() {
        let schema = OutputSchema::of::<Verdict>();
        assert_eq!(schema.name, "Verdict");
        assert_eq!(schema.schema["type"], "object");
        assert!(schema.schema["properties"]["approved"].is_object());
    }
}
