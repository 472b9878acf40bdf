//! Single-turn state machine
//!
//! ```text
//! AwaitingUserInput ─► ModelQueried ─────────────────────────────────► TurnComplete
//!                           │                                              ▲
//!                           └► ToolRequested ─► ToolExecuted ─► ModelRequeried
//! ```
//!
//! At most one tool runs per turn. A tool call in the re-query reply is not
//! executed; its literal rendering becomes the reply.

use std::fmt;
use std::sync::Arc;

use super::language::{KeywordLanguagePolicy, LanguagePolicy};
use super::prompt::SystemPrompts;
use crate::completion::{CompletionRequest, CompletionService, Reply};
use crate::session::{ConversationSession, ToolCall};
use crate::tools::ToolRegistry;
use crate::{Error, Result};

/// Reply recorded when the completion service fails
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your request.";

/// Position of the processor within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    AwaitingUserInput,
    ModelQueried,
    ToolRequested,
    ToolExecuted,
    ModelRequeried,
    TurnComplete,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingUserInput => "awaiting_user_input",
            Self::ModelQueried => "model_queried",
            Self::ToolRequested => "tool_requested",
            Self::ToolExecuted => "tool_executed",
            Self::ModelRequeried => "model_requeried",
            Self::TurnComplete => "turn_complete",
        };
        f.write_str(name)
    }
}

/// Result of a processed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Input was empty; nothing was appended and no model call was made
    Skipped,
    Completed(CompletedTurn),
}

impl TurnOutcome {
    /// Final reply text, if the turn ran
    #[must_use]
    pub fn reply(&self) -> Option<&str> {
        match self {
            Self::Skipped => None,
            Self::Completed(turn) => Some(&turn.reply),
        }
    }
}

/// Details of a completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTurn {
    /// Text appended as the final assistant turn
    pub reply: String,
    /// Tool executed during the turn
    pub tool: Option<String>,
    /// Whether the reply is the fallback after a completion failure
    pub fell_back: bool,
    /// States visited, in order
    pub path: Vec<TurnState>,
}

/// Drives turns through query, optional tool call and re-query
pub struct TurnProcessor {
    completion: Arc<dyn CompletionService>,
    tools: Arc<ToolRegistry>,
    prompts: SystemPrompts,
    language: Box<dyn LanguagePolicy>,
    fallback_reply: String,
    state: TurnState,
}

impl TurnProcessor {
    #[must_use]
    pub fn new(
        completion: Arc<dyn CompletionService>,
        tools: Arc<ToolRegistry>,
        prompts: SystemPrompts,
    ) -> Self {
        Self {
            completion,
            tools,
            prompts,
            language: Box::new(KeywordLanguagePolicy::default()),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            state: TurnState::AwaitingUserInput,
        }
    }

    /// Replace the per-turn language detection
    #[must_use]
    pub fn with_language_policy(mut self, policy: impl LanguagePolicy + 'static) -> Self {
        self.language = Box::new(policy);
        self
    }

    #[must_use]
    pub fn with_fallback_reply(mut self, reply: impl Into<String>) -> Self {
        self.fallback_reply = reply.into();
        self
    }

    /// State reached by the most recent turn
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    #[must_use]
    pub fn fallback_reply(&self) -> &str {
        &self.fallback_reply
    }

    /// System instruction a turn with this text would use
    ///
    /// The session hint wins; otherwise the language policy inspects the
    /// text. Detection never changes the session hint.
    #[must_use]
    pub fn system_instruction(&self, session: &ConversationSession, user_text: &str) -> &str {
        let hint = session
            .language_hint()
            .or_else(|| self.language.detect(user_text));
        self.prompts.select(hint)
    }

    /// Run one turn for `user_text`
    ///
    /// Completion failures are absorbed into the fallback reply. Tool
    /// failures are reported to the model as the tool result.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToolCall` if the model's arguments are not a JSON
    /// object and `UnknownTool` if it names an unregistered tool. In both
    /// cases only the user turn has been appended.
    pub async fn process(
        &mut self,
        session: &mut ConversationSession,
        user_text: &str,
    ) -> Result<TurnOutcome> {
        self.state = TurnState::AwaitingUserInput;

        let text = user_text.trim();
        if text.is_empty() {
            tracing::debug!("empty input, skipping turn");
            return Ok(TurnOutcome::Skipped);
        }

        let mut path = vec![TurnState::AwaitingUserInput];
        let system = self.system_instruction(session, text).to_string();

        session.append_user(text);

        let first = self.query(&system, session, true).await;
        self.advance(TurnState::ModelQueried, &mut path);

        let (reply, tool, fell_back) = match first {
            Err(e) => {
                tracing::warn!(error = %e, "completion failed, using fallback reply");
                (self.fallback_reply.clone(), None, true)
            }
            Ok(Reply::Text(text)) => (text, None, false),
            Ok(Reply::ToolCall(request)) => {
                self.advance(TurnState::ToolRequested, &mut path);

                let arguments = request.parse_arguments()?;
                if !self.tools.contains(&request.name) {
                    return Err(Error::UnknownTool(request.name));
                }

                tracing::info!(tool = %request.name, arguments = %request.raw_arguments, "model requested tool");
                session.append_assistant(
                    None,
                    Some(ToolCall {
                        id: request.id,
                        name: request.name.clone(),
                        arguments: arguments.clone(),
                    }),
                );

                let result = match self.tools.resolve(&request.name, &arguments).await {
                    Ok(result) => result,
                    Err(e @ Error::UnknownTool(_)) => return Err(e),
                    Err(e) => {
                        tracing::warn!(tool = %request.name, error = %e, "tool failed");
                        format!("Error: {e}")
                    }
                };
                session.append_tool_result(&request.name, result)?;
                self.advance(TurnState::ToolExecuted, &mut path);

                let second = self.query(&system, session, false).await;
                self.advance(TurnState::ModelRequeried, &mut path);

                match second {
                    Ok(Reply::Text(text)) => (text, Some(request.name), false),
                    Ok(chained @ Reply::ToolCall(_)) => {
                        tracing::warn!("tool call in re-query reply not executed");
                        (chained.into_text(), Some(request.name), false)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "re-query failed, using fallback reply");
                        (self.fallback_reply.clone(), Some(request.name), true)
                    }
                }
            }
        };

        session.append_assistant(Some(reply.clone()), None);
        self.advance(TurnState::TurnComplete, &mut path);

        tracing::info!(
            tool = ?tool,
            fell_back,
            history = session.len(),
            "turn complete"
        );

        Ok(TurnOutcome::Completed(CompletedTurn {
            reply,
            tool,
            fell_back,
            path,
        }))
    }

    async fn query(
        &self,
        system: &str,
        session: &ConversationSession,
        offer_tools: bool,
    ) -> Result<Reply> {
        let tools = if offer_tools {
            self.tools.descriptors()
        } else {
            &[]
        };

        self.completion
            .complete(CompletionRequest {
                system,
                history: session.history(),
                tools,
            })
            .await
    }

    fn advance(&mut self, next: TurnState, path: &mut Vec<TurnState>) {
        tracing::trace!(from = %self.state, to = %next, "turn state");
        self.state = next;
        path.push(next);
    }
}
