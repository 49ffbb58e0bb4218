use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::{ClassifierError, ClassifierResult};

const DEFAULT_MODEL: &str = "gpt-5";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (from OPENAI_API_KEY env var)
    pub api_key: String,
    /// Model to use (e.g., "gpt-5")
    pub model: String,
    /// API root, without a trailing slash
    pub base_url: String,
}

impl OpenAiConfig {
    /// Create config from environment variables
    pub fn from_env() -> ClassifierResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let mut config = Self::new(api_key, DEFAULT_MODEL.to_string())?;

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url.trim_end_matches('/').to_string();
            }
        }

        Ok(config)
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> ClassifierResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ClassifierError::Configuration(
                "OPENAI_API_KEY environment variable is not set".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }
}

/// Failures talking to the reasoning service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("API returned empty response")]
    EmptyResponse,

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Expected shape of the service's message content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

/// A function the service may call instead of answering in text
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: serde_json::Value,
}

/// One round trip to the reasoning service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceRequest {
    pub system: String,
    pub user: String,
    pub response_format: ResponseFormat,
    pub tools: Vec<ToolDefinition>,
}

/// A structured function invocation requested by the service
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// What the service answered with
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceReply {
    /// Parsed JSON object content (JSON response mode)
    Json(serde_json::Value),
    /// One or more tool invocations
    ToolCalls(Vec<ToolCall>),
    /// Plain text message
    Text(String),
}

/// A remote model that can answer mapping and review requests
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, request: &ServiceRequest) -> Result<ServiceReply, ServiceError>;
}

/// OpenAI chat-completions client
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, request: &ServiceRequest) -> ChatRequest {
        let tools: Vec<ChatTool> = request
            .tools
            .iter()
            .map(|tool| ChatTool {
                tool_type: "function".to_string(),
                function: ChatFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect();

        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            response_format: match request.response_format {
                ResponseFormat::JsonObject => Some(ResponseFormatSpec {
                    format_type: "json_object".to_string(),
                }),
                ResponseFormat::Text => None,
            },
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            tools,
        }
    }
}

#[async_trait]
impl ReasoningService for OpenAiClient {
    async fn complete(&self, request: &ServiceRequest) -> Result<ServiceReply, ServiceError> {
        let body = self.build_request(request);

        debug!(
            model = %self.config.model,
            tools = body.tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let response: ChatResponse = response.json().await?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ServiceError::Other("No choices in response".to_string()))?;

        reply_from_message(message, request.response_format)
    }
}

/// Convert a chat message into a typed reply
fn reply_from_message(
    message: ResponseMessage,
    format: ResponseFormat,
) -> Result<ServiceReply, ServiceError> {
    if !message.tool_calls.is_empty() {
        let mut calls = Vec::with_capacity(message.tool_calls.len());
        for call in message.tool_calls {
            let arguments: serde_json::Value = serde_json::from_str(&call.function.arguments)?;
            calls.push(ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            });
        }
        return Ok(ServiceReply::ToolCalls(calls));
    }

    let content = message.content.unwrap_or_default();

    match format {
        ResponseFormat::JsonObject => {
            if content.trim().is_empty() {
                return Err(ServiceError::EmptyResponse);
            }
            Ok(ServiceReply::Json(serde_json::from_str(&content)?))
        }
        ResponseFormat::Text => Ok(ServiceReply::Text(content)),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormatSpec {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    arguments: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ResponseToolCall>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ResponseToolCall>>::deserialize(deserializer)?.unwrap_or_default())
}
