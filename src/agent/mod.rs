//! Turn processing
//!
//! [`TurnProcessor`] drives one conversational turn against a
//! [`ConversationSession`](crate::session::ConversationSession): it picks the
//! system instruction, queries the model, runs at most one tool call and
//! records every step in the session history.

mod language;
mod processor;
mod prompt;

pub use language::{KeywordLanguagePolicy, LanguagePolicy, SPANISH_TRIGGERS, detect_language_hint};
pub use processor::{CompletedTurn, DEFAULT_FALLBACK_REPLY, TurnOutcome, TurnProcessor, TurnState};
pub use prompt::{Mode, SystemPrompts};
