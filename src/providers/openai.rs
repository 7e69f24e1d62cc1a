use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

use crate::event_bus::{Event, EventBus};
use crate::llm::{FunctionSpec, LLMProvider};

/// OpenAI chat-completions provider
pub struct OpenAIProvider {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: Option<u32>,
    event_bus: Option<Arc<EventBus>>,
    cost_per_1m_input_tokens: f32,
    cost_per_1m_output_tokens: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ToolDef {
    #[serde(rename = "type")]
    tool_type: String,
    function: FunctionDef,
}

#[derive(Debug, Serialize)]
struct FunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

impl From<&FunctionSpec> for ToolDef {
    fn from(spec: &FunctionSpec) -> Self {
        ToolDef {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    #[allow(dead_code)]
    id: String,
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    /// Arguments arrive as a JSON-encoded string, not an object.
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the API key taken from the
    /// environment.
    pub fn new(model: String, temperature: f32) -> Result<Self> {
        let api_key =
            env::var("OPENAI_API_KEY").context("OPENAI_API_KEY environment variable not set")?;
        Ok(Self {
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            temperature,
            max_tokens: None,
            event_bus: None,
            cost_per_1m_input_tokens: 0.0,
            cost_per_1m_output_tokens: 0.0,
        })
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Cap completion length (used for report generation)
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set event bus for metrics reporting
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Set cost per 1 million input tokens
    pub fn with_cost_per_1m_input_tokens(mut self, cost: f32) -> Self {
        self.cost_per_1m_input_tokens = cost;
        self
    }

    /// Set cost per 1 million output tokens
    pub fn with_cost_per_1m_output_tokens(mut self, cost: f32) -> Self {
        self.cost_per_1m_output_tokens = cost;
        self
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error: {}", error_text));
        }

        let response_text = response.text().await?;
        debug!("Raw OpenAI response: {}", response_text);

        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse OpenAI response. Error: {}", e);
            error!("Raw response was: {}", response_text);
            anyhow!("Failed to parse OpenAI response: {}", e)
        })?;

        // Report real token usage when the API returns it
        if let Some(usage) = &chat_response.usage {
            let input_cost =
                (usage.prompt_tokens as f32 * self.cost_per_1m_input_tokens) / 1_000_000.0;
            let output_cost =
                (usage.completion_tokens as f32 * self.cost_per_1m_output_tokens) / 1_000_000.0;

            if let Some(event_bus) = &self.event_bus {
                let _ = event_bus
                    .emit(Event::APICallCompleted {
                        provider: "openai".to_string(),
                        tokens: usage.total_tokens,
                        cost: input_cost + output_cost,
                    })
                    .await;
            }
        }

        Ok(chat_response)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn handles_own_metrics(&self) -> bool {
        true
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            tools: None,
            tool_choice: None,
        };

        let response = self.send(&request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("No response content from OpenAI"))
    }

    async fn call_function(
        &self,
        system: &str,
        user: &str,
        function: &FunctionSpec,
    ) -> Result<Option<serde_json::Value>> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.0),
            max_tokens: None,
            tools: Some(vec![ToolDef::from(function)]),
            // Force the named function so the model always answers with
            // structured arguments rather than prose.
            tool_choice: Some(serde_json::json!({
                "type": "function",
                "function": { "name": function.name }
            })),
        };

        let response = self.send(&request).await?;

        let arguments = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.tool_calls)
            .and_then(|calls| calls.into_iter().find(|c| c.function.name == function.name))
            .map(|c| c.function.arguments);

        match arguments {
            Some(raw) => {
                let value: serde_json::Value = serde_json::from_str(&raw)
                    .with_context(|| format!("Malformed function arguments: {}", raw))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
