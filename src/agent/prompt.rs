//! System instructions

use crate::session::LanguageHint;

/// Interaction mode the instructions are written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Spoken conversation through the microphone and speakers
    #[default]
    Voice,
    /// Typed conversation at the console
    Text,
}

/// Default and secondary-language system instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompts {
    default: String,
    spanish: String,
}

impl SystemPrompts {
    #[must_use]
    pub fn new(default: impl Into<String>, spanish: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            spanish: spanish.into(),
        }
    }

    /// Built-in instructions for a mode
    #[must_use]
    pub fn for_mode(mode: Mode) -> Self {
        let (persona, audience) = match mode {
            Mode::Voice => (
                "You're a helpful voice assistant",
                "Be polite and concise since you're speaking to a human.",
            ),
            Mode::Text => ("You're a helpful assistant", "Be polite and concise."),
        };
        let tools = "If the user asks about weather, use the get_weather function.";

        Self {
            default: format!("{persona}. {audience} {tools}"),
            spanish: format!("{persona} that speaks Spanish. {audience} Respond in Spanish. {tools}"),
        }
    }

    /// Instruction for a turn with the given hint
    #[must_use]
    pub fn select(&self, hint: Option<LanguageHint>) -> &str {
        match hint {
            Some(LanguageHint::Spanish) => &self.spanish,
            None => &self.default,
        }
    }
}

impl Default for SystemPrompts {
    fn default() -> Self {
        Self::for_mode(Mode::Voice)
    }
}
