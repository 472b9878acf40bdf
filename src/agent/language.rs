//! Per-turn language detection

use crate::session::LanguageHint;

/// Words that switch a turn to the Spanish instruction
pub const SPANISH_TRIGGERS: [&str; 5] = ["spanish", "hola", "buenos", "gracias", "español"];

/// Decides whether user text asks for a secondary-language instruction
pub trait LanguagePolicy: Send + Sync {
    fn detect(&self, text: &str) -> Option<LanguageHint>;
}

impl<F> LanguagePolicy for F
where
    F: Fn(&str) -> Option<LanguageHint> + Send + Sync,
{
    fn detect(&self, text: &str) -> Option<LanguageHint> {
        self(text)
    }
}

/// Case-insensitive substring match against a fixed trigger list
#[derive(Debug, Clone)]
pub struct KeywordLanguagePolicy {
    hint: LanguageHint,
    triggers: Vec<String>,
}

impl KeywordLanguagePolicy {
    #[must_use]
    pub fn new(hint: LanguageHint, triggers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            hint,
            triggers: triggers
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .collect(),
        }
    }

    #[must_use]
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }
}

impl Default for KeywordLanguagePolicy {
    fn default() -> Self {
        Self::new(LanguageHint::Spanish, SPANISH_TRIGGERS)
    }
}

impl LanguagePolicy for KeywordLanguagePolicy {
    fn detect(&self, text: &str) -> Option<LanguageHint> {
        let lower = text.to_lowercase();
        self.triggers
            .iter()
            .any(|t| lower.contains(t.as_str()))
            .then_some(self.hint)
    }
}

/// Detect a language hint with the default Spanish triggers
#[must_use]
pub fn detect_language_hint(text: &str) -> Option<LanguageHint> {
    KeywordLanguagePolicy::default().detect(text)
}
