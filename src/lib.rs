//! Murmur - push-to-talk voice agent
//!
//! This library provides the pieces of a single-user conversational agent:
//! - Conversation history with a session-wide language hint
//! - A turn processor that runs at most one tool call per turn
//! - Chat completion, speech-to-text and text-to-speech clients
//! - Microphone capture and speaker playback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Console                          │
//! │         voice (push-to-talk)  │  text REPL           │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Daemon                           │
//! │   AudioDevice  │  STT  │  TurnProcessor  │  TTS      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        OpenAI-compatible API  │  ToolRegistry        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod completion;
pub mod config;
pub mod daemon;
pub mod error;
pub mod session;
pub mod tools;
pub mod voice;

pub use agent::{Mode, SystemPrompts, TurnOutcome, TurnProcessor};
pub use completion::{CompletionService, Reply};
pub use config::Config;
pub use daemon::{Daemon, VoiceIo, VoiceTurn};
pub use error::{Error, Result};
pub use session::{ConversationSession, LanguageHint, Role, Turn};
pub use tools::{ToolDescriptor, ToolHandler, ToolRegistry};
