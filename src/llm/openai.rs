//! OpenAI-compatible chat completions client
//!
//! Speaks the `/chat/completions` dialect shared by OpenAI, Ollama's `/v1`
//! endpoint, vLLM and most hosted gateways. Tool calling runs as a loop: the
//! model's requested calls are executed through the request's
//! [`ToolBundle`](cyro_tools::ToolBundle) and fed back as `tool` messages
//! until it answers without calling anything.

use super::{ModelCaller, ModelProvider, ModelRequest, OutputSchema};
use crate::types::{CyroError, Result};
use crate::utils::settings::ProviderSettings;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Client bound to one model on an OpenAI-compatible endpoint
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    max_tool_iterations: usize,
}

impl OpenAiCompatibleClient {
    pub fn new(settings: &ProviderSettings, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| CyroError::Model(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(http, settings, model))
    }

    /// Build on a shared `reqwest` client
    pub fn with_http_client(
        http: reqwest::Client,
        settings: &ProviderSettings,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: settings.api_key(),
            timeout: settings.timeout(),
            max_tool_iterations: settings.max_tool_iterations.max(1),
        }
    }

    /// Replace the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn initial_messages(request: &ModelRequest<'_>) -> Vec<Value> {
        let system = match request.instructions {
            Some(instructions) if !instructions.trim().is_empty() => {
                format!("{}\n\n{}", request.system_prompt, instructions)
            }
            _ => request.system_prompt.to_string(),
        };

        let mut messages = Vec::with_capacity(2);
        if !system.trim().is_empty() {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.user_prompt}));
        messages
    }

    /// Run the completion loop and return the final assistant text
    async fn complete(
        &self,
        request: &ModelRequest<'_>,
        response_format: Option<Value>,
    ) -> Result<String> {
        let mut messages = Self::initial_messages(request);
        let tools: Vec<Value> = request
            .tools
            .definitions()
            .into_iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    }
                })
            })
            .collect();

        for iteration in 1..=self.max_tool_iterations {
            let mut body = json!({
                "model": self.model,
                "messages": messages,
                "stream": false
            });
            if !tools.is_empty() {
                body["tools"] = json!(tools);
            }
            if let Some(format) = &response_format {
                body["response_format"] = format.clone();
            }

            let reply = self.post_chat(&body).await?;
            let message = reply
                .pointer("/choices/0/message")
                .cloned()
                .ok_or_else(|| CyroError::Model("No message in response".into()))?;

            let calls = message
                .get("tool_calls")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if calls.is_empty() {
                return Ok(message
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string());
            }

            debug!(iteration, calls = calls.len(), model = %self.model, "Model requested tool calls");
            messages.push(message);
            for call in &calls {
                messages.push(self.run_tool_call(request, call).await);
            }
        }

        Err(CyroError::Model(format!(
            "Max tool iterations ({}) exceeded",
            self.max_tool_iterations
        )))
    }

    /// Execute one requested call; failures go back to the model as `{"error": ...}`
    async fn run_tool_call(&self, request: &ModelRequest<'_>, call: &Value) -> Value {
        let id = call.get("id").and_then(Value::as_str).unwrap_or("");
        let name = call
            .pointer("/function/name")
            .and_then(Value::as_str)
            .unwrap_or("");
        // OpenAI sends arguments as a JSON string, Ollama as an object.
        let arguments = match call.pointer("/function/arguments") {
            Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or_else(|_| json!({})),
            Some(other) => other.clone(),
            None => json!({}),
        };

        let result = match request.tools.execute(name, arguments).await {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                json!({"error": e.to_string()})
            }
        };

        json!({
            "role": "tool",
            "tool_call_id": id,
            "name": name,
            "content": result.to_string()
        })
    }

    async fn post_chat(&self, body: &Value) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CyroError::Timeout(self.timeout)
            } else {
                CyroError::Model(format!("HTTP request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CyroError::Model(format!(
                "Request to {} failed ({}): {}",
                url, status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CyroError::Model(format!("Failed to parse response: {}", e)))
    }
}

/// Parse a JSON reply, tolerating a surrounding markdown code fence
pub fn parse_json_reply(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
        .map(|inner| inner.trim_start_matches("json").trim())
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced)
        .map_err(|e| CyroError::Model(format!("Model did not return valid JSON: {}", e)))
}

#[async_trait]
impl ModelCaller for OpenAiCompatibleClient {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String> {
        self.complete(request, None).await
    }

    async fn generate_structured(
        &self,
        request: &ModelRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value> {
        let format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema
            }
        });
        let text = self.complete(request, Some(format)).await?;
        parse_json_reply(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider handing out [`OpenAiCompatibleClient`]s that share one connection pool
pub struct OpenAiCompatibleProvider {
    http: reqwest::Client,
    settings: ProviderSettings,
}

impl OpenAiCompatibleProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| CyroError::Model(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

impl ModelProvider for OpenAiCompatibleProvider {
    fn caller(&self, model: Option<&str>) -> Result<Arc<dyn ModelCaller>> {
        let model = model.unwrap_or(&self.settings.model);
        Ok(Arc::new(OpenAiCompatibleClient::with_http_client(
            self.http.clone(),
            &self.settings,
            model,
        )))
    }
}
