//! `OpenAI`-compatible chat completions client (non-streaming)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, CompletionService, Reply, ToolCallRequest};
use crate::session::Turn;
use crate::tools::ToolDescriptor;
use crate::{Error, Result};

/// Chat completions over HTTP
pub struct OpenAiChat {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiChat {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for OpenAiChat {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Reply> {
        let body = ChatRequest {
            model: &self.model,
            messages: to_wire_messages(request.system, request.history),
            tools: request.tools.iter().map(WireTool::from).collect(),
            tool_choice: (!request.tools.is_empty()).then_some("auto"),
            stream: false,
        };

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion request failed");
                Error::CompletionService(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion API error");
            return Err(Error::CompletionService(format!(
                "chat completion error {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::CompletionService(format!("failed to parse response: {e}")))?;

        reply_from_response(parsed)
    }
}

/// A message in the chat completions wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    /// Serialized as `null` for tool-call-only assistant messages
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Convert the system instruction and history to wire messages
///
/// `ToolResult` turns become `tool` messages; assistant tool calls carry
/// their arguments re-serialized as a JSON string.
#[must_use]
pub fn to_wire_messages(system: &str, history: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::text("system", system));

    for turn in history {
        let message = match turn {
            Turn::User { content } => ChatMessage::text("user", content),
            Turn::Assistant { content, tool_call } => ChatMessage {
                role: "assistant".to_string(),
                content: content.clone(),
                tool_calls: tool_call.as_ref().map(|call| {
                    vec![WireToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: WireFunction {
                            name: call.name.clone(),
                            arguments: call.arguments_json(),
                        },
                    }]
                }),
                tool_call_id: None,
            },
            Turn::ToolResult {
                call_id, content, ..
            } => ChatMessage {
                role: "tool".to_string(),
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: Some(call_id.clone()),
            },
        };
        messages.push(message);
    }

    messages
}

fn reply_from_response(response: ChatResponse) -> Result<Reply> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::CompletionService("response contained no choices".to_string()))?;

    let mut tool_calls = choice.message.tool_calls.unwrap_or_default().into_iter();
    if let Some(call) = tool_calls.next() {
        let ignored = tool_calls.count();
        if ignored > 0 {
            tracing::warn!(ignored, "model requested several tool calls, using the first");
        }
        return Ok(Reply::ToolCall(ToolCallRequest {
            id: call.id,
            name: call.function.name,
            raw_arguments: call.function.arguments,
        }));
    }

    choice
        .message
        .content
        .map(Reply::Text)
        .ok_or_else(|| Error::CompletionService("reply had neither content nor tool call".to_string()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    stream: bool,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireToolFunction<'a>,
}

#[derive(Serialize)]
struct WireToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

impl<'a> From<&'a ToolDescriptor> for WireTool<'a> {
    fn from(descriptor: &'a ToolDescriptor) -> Self {
        Self {
            kind: "function",
            function: WireToolFunction {
                name: &descriptor.name,
                description: &descriptor.description,
                parameters: &descriptor.parameters,
            },
        }
    }
}

/// Tool call as carried on assistant messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: WireFunction,
}

/// Function name plus JSON-encoded arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    /// Some compatible servers send an explicit `null` on text replies
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}
