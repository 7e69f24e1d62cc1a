use crate::config::Config;
use crate::event_bus::{Event, EventBus, EventEmitter};
use crate::impl_event_emitter;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A function the model can be asked to call, in the provider's wire schema.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the function parameters.
    pub parameters: serde_json::Value,
}

/// Trait representing an LLM provider.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Name of the provider.
    fn name(&self) -> &str;

    /// Model name of the provider.
    fn model_name(&self) -> &str {
        "Unknown"
    }

    /// Send a plain completion request and return the response text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Force a call to `function` and return its parsed arguments, or `None`
    /// when the model produced no usable call.
    async fn call_function(
        &self,
        system: &str,
        user: &str,
        function: &FunctionSpec,
    ) -> Result<Option<serde_json::Value>>;

    /// Whether this provider handles its own metrics and cost tracking.
    /// If true, LLMManager will not emit duplicate APICallCompleted events.
    fn handles_own_metrics(&self) -> bool {
        false
    }
}

/// Wraps the active provider and emits API lifecycle events around each call.
pub struct LLMManager {
    provider: Box<dyn LLMProvider>,
    event_bus: Option<Arc<EventBus>>,
    config: Option<Arc<Config>>,
}

impl LLMManager {
    pub fn new(provider: Box<dyn LLMProvider>, event_bus: Arc<EventBus>, config: Arc<Config>) -> Self {
        Self {
            provider,
            event_bus: Some(event_bus),
            config: Some(config),
        }
    }

    #[cfg(test)]
    pub fn without_bus(provider: Box<dyn LLMProvider>) -> Self {
        Self {
            provider,
            event_bus: None,
            config: None,
        }
    }

    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.emit_started().await;
        let result = self.provider.complete(system, user).await;
        match &result {
            Ok(response) => self.emit_completed(system.len() + user.len(), response.len()).await,
            Err(e) => self.emit_error(e).await,
        }
        result
    }

    pub async fn call_function(
        &self,
        system: &str,
        user: &str,
        function: &FunctionSpec,
    ) -> Result<Option<serde_json::Value>> {
        self.emit_started().await;
        let result = self.provider.call_function(system, user, function).await;
        match &result {
            Ok(arguments) => {
                let output_len = arguments.as_ref().map(|v| v.to_string().len()).unwrap_or(0);
                self.emit_completed(system.len() + user.len(), output_len).await;
            }
            Err(e) => self.emit_error(e).await,
        }
        result
    }

    async fn emit_started(&self) {
        if let Some(bus) = &self.event_bus {
            let _ = bus
                .emit(Event::APICallStarted {
                    provider: self.provider.name().to_string(),
                    model: self.provider.model_name().to_string(),
                })
                .await;
        }
    }

    async fn emit_completed(&self, input_chars: usize, output_chars: usize) {
        if self.provider.handles_own_metrics() {
            return;
        }
        if let Some(bus) = &self.event_bus {
            // Rough estimate: 1 token ≈ 4 characters.
            let input_tokens = input_chars / 4;
            let output_tokens = output_chars / 4;
            let _ = bus
                .emit(Event::APICallCompleted {
                    provider: self.provider.name().to_string(),
                    tokens: input_tokens + output_tokens,
                    cost: self.calculate_cost(input_tokens, output_tokens),
                })
                .await;
        }
    }

    async fn emit_error(&self, error: &anyhow::Error) {
        if let Some(bus) = &self.event_bus {
            let _ = bus
                .emit(Event::APIError {
                    provider: self.provider.name().to_string(),
                    error: error.to_string(),
                })
                .await;
        }
    }

    /// Calculate cost for an API call from the configured pricing.
    fn calculate_cost(&self, input_tokens: usize, output_tokens: usize) -> f32 {
        if let Some(config) = &self.config {
            let input_cost =
                config.openai.cost_per_1m_input_tokens * (input_tokens as f32) / 1_000_000.0;
            let output_cost =
                config.openai.cost_per_1m_output_tokens * (output_tokens as f32) / 1_000_000.0;
            input_cost + output_cost
        } else {
            0.0
        }
    }
}

// Implement EventEmitter trait for LLMManager
impl_event_emitter!(LLMManager);
