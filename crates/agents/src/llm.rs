//! HTTP client for an OpenAI-compatible chat completion service

use crate::config::ModelConfig;
use crate::{AgentError, Result};
use agentflow_core::{Message, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One entry of a completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    /// Calls requested by the model in an assistant entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on `tool` entries answering a call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Assistant entry that carries the model's tool calls back into the request
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new("assistant", "")
        }
    }

    /// Output of one tool call
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new("tool", content)
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self::new(role, message.content.clone())
    }
}

/// A function the model may call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: serde_json::Value,
}

/// A function call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the model wrote them
    #[serde(default)]
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// What the model did with a tool-enabled request
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

/// A language model that answers a list of messages with text
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Completion with tools on offer. Models without tool support answer in text.
    async fn complete_with_tools(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn> {
        let _ = tools;
        Ok(ModelTurn::Text(self.complete(messages).await?))
    }

    /// Model identifier, for logs
    fn model_id(&self) -> &str;
}

/// Client for `POST {base}/chat/completions`
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: ModelConfig,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(config: ModelConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Client configured from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ModelConfig::from_env()?))
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Health check against the model listing endpoint
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        Ok(response.status().is_success())
    }
}

impl ChatClient {
    async fn send(&self, request: &CompletionRequest<'_>) -> Result<ChoiceMessage> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response: CompletionResponse = builder
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::Capability("model returned no choices".into()))
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    #[instrument(skip(self, messages), fields(model = %self.config.model))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            tools: Vec::new(),
        };

        debug!("Requesting completion for {} messages", messages.len());
        extract_content(self.send(&request).await?)
    }

    #[instrument(skip(self, messages, tools), fields(model = %self.config.model, tools = tools.len()))]
    async fn complete_with_tools(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ModelTurn> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            tools: tools.iter().map(ToolPayload::function).collect(),
        };

        debug!("Requesting tool-enabled completion for {} messages", messages.len());
        extract_turn(self.send(&request).await?)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

fn extract_content(message: ChoiceMessage) -> Result<String> {
    let content = message
        .content
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(AgentError::Capability("model returned an empty completion".into()));
    }
    Ok(content)
}

fn extract_turn(message: ChoiceMessage) -> Result<ModelTurn> {
    match message.tool_calls {
        Some(calls) if !calls.is_empty() => Ok(ModelTurn::ToolCalls(calls)),
        _ => extract_content(message).map(ModelTurn::Text),
    }
}

// ==========================================
// REQUEST/RESPONSE TYPES
// ==========================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'static str,
    function: &'a ToolSpec,
}

impl<'a> ToolPayload<'a> {
    fn function(spec: &'a ToolSpec) -> Self {
        Self { r#type: "function", function: spec }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}
