//! Error types for Murmur

use thiserror::Error;

/// Result type alias for Murmur operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a voice conversation
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device capture or playback failure
    #[error("device error: {0}")]
    Device(String),

    /// Speech-to-text failure
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Text-to-speech failure
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Chat completion request failed or returned an unusable reply
    #[error("completion service error: {0}")]
    CompletionService(String),

    /// Tool call arguments were not a JSON object
    #[error("malformed tool call for {tool}: {reason}")]
    MalformedToolCall {
        /// Tool the model asked for
        tool: String,
        /// Why the payload was rejected
        reason: String,
    },

    /// Tool name not present in the registry
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool name registered twice
    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    /// Tool arguments do not satisfy the declared parameter schema
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Tool being invoked
        tool: String,
        /// First schema violation found
        reason: String,
    },

    /// Tool handler failed while running
    #[error("tool {tool} failed: {reason}")]
    ToolExecution {
        /// Tool being invoked
        tool: String,
        /// Failure reported by the handler
        reason: String,
    },

    /// Tool result has no matching assistant tool call in the session
    #[error("no pending tool call for {0}")]
    ToolCallMismatch(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
