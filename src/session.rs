//! Conversation session: the append-only turn history for one conversation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Role of a turn in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

impl Role {
    /// Lowercase name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::ToolResult => "tool_result",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary language that switches the system instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageHint {
    Spanish,
}

impl LanguageHint {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spanish => "spanish",
        }
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageHint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "spanish" | "es" | "español" => Ok(Self::Spanish),
            other => Err(Error::Config(format!("unsupported language hint: {other}"))),
        }
    }
}

/// A tool invocation recorded on an assistant turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier assigned by the completion service
    pub id: String,
    /// Registered tool name
    pub name: String,
    /// Parsed argument object
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Arguments serialized back to the JSON string the wire format carries
    #[must_use]
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

/// One role-tagged entry in the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User {
        content: String,
    },
    Assistant {
        /// `None` only when the turn is purely a tool invocation
        content: Option<String>,
        tool_call: Option<ToolCall>,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        content: String,
    },
}

impl Turn {
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::ToolResult { .. } => Role::ToolResult,
        }
    }

    /// Text content, if the turn has any
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::ToolResult { content, .. } => Some(content),
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }

    /// Tool call carried by an assistant turn
    #[must_use]
    pub const fn tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::Assistant { tool_call, .. } => tool_call.as_ref(),
            _ => None,
        }
    }
}

/// Ordered turn history plus the session-wide language hint
///
/// Turns are only ever appended; nothing is reordered, edited or removed.
#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    turns: Vec<Turn>,
    language_hint: Option<LanguageHint>,
}

impl ConversationSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with an explicit language hint
    #[must_use]
    pub const fn with_language_hint(hint: Option<LanguageHint>) -> Self {
        Self {
            turns: Vec::new(),
            language_hint: hint,
        }
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.push(Turn::User {
            content: text.into(),
        });
    }

    pub fn append_assistant(&mut self, text: Option<String>, tool_call: Option<ToolCall>) {
        self.push(Turn::Assistant {
            content: text,
            tool_call,
        });
    }

    /// Append the result of a tool invocation
    ///
    /// The call id is taken from the most recent assistant turn that invoked
    /// `tool_name`.
    ///
    /// # Errors
    ///
    /// Returns `ToolCallMismatch` if no earlier assistant turn called the tool
    pub fn append_tool_result(
        &mut self,
        tool_name: &str,
        result_text: impl Into<String>,
    ) -> Result<()> {
        let call_id = self
            .turns
            .iter()
            .rev()
            .filter_map(Turn::tool_call)
            .find(|call| call.name == tool_name)
            .map(|call| call.id.clone())
            .ok_or_else(|| Error::ToolCallMismatch(tool_name.to_string()))?;

        self.push(Turn::ToolResult {
            call_id,
            tool_name: tool_name.to_string(),
            content: result_text.into(),
        });
        Ok(())
    }

    /// Read-only view of every turn, in append order
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn set_language_hint(&mut self, hint: Option<LanguageHint>) {
        tracing::debug!(hint = ?hint, "language hint set");
        self.language_hint = hint;
    }

    #[must_use]
    pub const fn language_hint(&self) -> Option<LanguageHint> {
        self.language_hint
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn push(&mut self, turn: Turn) {
        tracing::trace!(role = %turn.role(), index = self.turns.len(), "turn appended");
        self.turns.push(turn);
    }
}
