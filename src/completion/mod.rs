//! Chat completion service boundary
//!
//! The turn processor talks to the language model only through
//! [`CompletionService`]. A reply is either plain text or a single tool-call
//! directive; nothing is streamed.

mod openai;

pub use openai::{ChatMessage, OpenAiChat, WireFunction, WireToolCall, to_wire_messages};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::session::Turn;
use crate::tools::ToolDescriptor;
use crate::{Error, Result};

/// One blocking completion request
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// System instruction for this turn
    pub system: &'a str,
    /// Full conversation history
    pub history: &'a [Turn],
    /// Tools to advertise; empty means no tools are offered
    pub tools: &'a [ToolDescriptor],
}

/// Tool invocation requested by the model, before its arguments are parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    /// Call identifier to echo back with the result
    pub id: String,
    pub name: String,
    /// Serialized argument payload exactly as the model sent it
    pub raw_arguments: String,
}

impl ToolCallRequest {
    /// Parse the raw payload into an argument object
    ///
    /// An empty payload is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToolCall` if the payload is not a JSON object
    pub fn parse_arguments(&self) -> Result<Map<String, Value>> {
        if self.raw_arguments.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&self.raw_arguments) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::MalformedToolCall {
                tool: self.name.clone(),
                reason: format!("expected a JSON object, got {other}"),
            }),
            Err(e) => Err(Error::MalformedToolCall {
                tool: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Text rendering used when a directive is not executed
    #[must_use]
    pub fn literal(&self) -> String {
        format!("{}({})", self.name, self.raw_arguments)
    }
}

/// Model reply: plain text or one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    ToolCall(ToolCallRequest),
}

impl Reply {
    /// Reply as final text, without executing any tool call
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::ToolCall(call) => call.literal(),
        }
    }
}

/// Remote language model
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one non-streaming completion
    ///
    /// # Errors
    ///
    /// Returns `CompletionService` on transport, status or decoding failure
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Reply>;
}
