//! Mock implementations for testing.
//!
//! [`MockModelCaller`] stands in for a real model. Free-text calls echo the
//! agent's system prompt and the user message so tests can tell which agent
//! answered; structured calls return a scripted selection. Every call is
//! counted.
//!
//! ```ignore
//! let caller = MockModelCaller::new();
//! let provider = Arc::new(MockProvider::new(Arc::clone(&caller)));
//! let router = RouterBuilder::new(settings, provider).agents_dir(dir).build()?;
//!
//! caller.set_selection(json!({"recommended_agent": "x", "agent_id": id, "reasoning": "..."}));
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use cyro::llm::{ModelCaller, ModelProvider, ModelRequest, OutputSchema};
use cyro::{CyroError, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted model caller with call counting and failure modes.
#[derive(Default)]
pub struct MockModelCaller {
    selection: Mutex<Option<Value>>,
    fail_structured: Mutex<Option<String>>,
    fail_generate: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    generate_calls: AtomicUsize,
    structured_calls: AtomicUsize,
}

impl MockModelCaller {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Value returned by every structured call
    pub fn set_selection(&self, selection: Value) {
        *self.selection.lock() = Some(selection);
    }

    /// Make structured calls fail with a model error
    pub fn fail_structured(&self, message: &str) {
        *self.fail_structured.lock() = Some(message.to_string());
    }

    /// Make free-text calls fail with a model error
    pub fn fail_generate(&self, message: &str) {
        *self.fail_generate.lock() = Some(message.to_string());
    }

    /// Sleep before answering structured calls
    pub fn delay_structured(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn structured_calls(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.generate_calls() + self.structured_calls()
    }

    /// The reply a free-text call produces for this system prompt and message
    pub fn expected_reply(system_prompt: &str, message: &str) -> String {
        format!("[{}] {}", system_prompt, message)
    }
}

#[async_trait]
impl ModelCaller for MockModelCaller {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_generate.lock().clone() {
            return Err(CyroError::Model(message));
        }
        Ok(Self::expected_reply(request.system_prompt, request.user_prompt))
    }

    async fn generate_structured(
        &self,
        _request: &ModelRequest<'_>,
        _schema: &OutputSchema,
    ) -> Result<Value> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.fail_structured.lock().clone() {
            return Err(CyroError::Model(message));
        }
        self.selection
            .lock()
            .clone()
            .ok_or_else(|| CyroError::Model("no selection scripted".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Wraps a shared caller so the model name can differ per agent
struct NamedCaller {
    inner: Arc<MockModelCaller>,
    model: String,
}

#[async_trait]
impl ModelCaller for NamedCaller {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String> {
        self.inner.generate(request).await
    }

    async fn generate_structured(
        &self,
        request: &ModelRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value> {
        self.inner.generate_structured(request, schema).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider handing out the same [`MockModelCaller`] for every model.
pub struct MockProvider {
    caller: Arc<MockModelCaller>,
    requested: Mutex<Vec<Option<String>>>,
}

impl MockProvider {
    pub fn new(caller: Arc<MockModelCaller>) -> Self {
        Self {
            caller,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Model overrides requested so far, in order
    pub fn requested_models(&self) -> Vec<Option<String>> {
        self.requested.lock().clone()
    }
}

impl ModelProvider for MockProvider {
    fn caller(&self, model: Option<&str>) -> Result<Arc<dyn ModelCaller>> {
        self.requested.lock().push(model.map(String::from));
        Ok(Arc::new(NamedCaller {
            inner: Arc::clone(&self.caller),
            model: model.unwrap_or("mock-model").to_string(),
        }))
    }
}
