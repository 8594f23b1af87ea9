//! Response languages and the system prompt each one selects.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A response language the assistant can be asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    English,
    French,
    Spanish,
    German,
    Italian,
    Portuguese,
}

/// Every supported locale, in the order the language picker shows them.
pub const SUPPORTED_LOCALES: [Locale; 6] = [
    Locale::English,
    Locale::French,
    Locale::Spanish,
    Locale::German,
    Locale::Italian,
    Locale::Portuguese,
];

/// The locale used when nothing else is selected, and whose prompt backs
/// any lookup that has no mapping of its own.
pub const DEFAULT_LOCALE: Locale = Locale::English;

const LANGUAGE_PROMPTS: [(&str, &str); 6] = [
    ("English", "You are a data analyst. Provide clear insights."),
    (
        "French",
        "Vous êtes un analyste de données. Fournissez des analyses claires en français.",
    ),
    (
        "Spanish",
        "Eres un analista de datos. Proporciona análisis claros en español.",
    ),
    (
        "German",
        "Sie sind ein Datenanalyst. Geben Sie klare Analysen auf Deutsch.",
    ),
    (
        "Italian",
        "Sei un analista di dati. Fornisci analisi chiare in italiano.",
    ),
    (
        "Portuguese",
        "Você é um analista de dados. Forneça insights claros em português.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLocale(pub String);

impl Locale {
    pub fn name(&self) -> &'static str {
        match self {
            Locale::English => "English",
            Locale::French => "French",
            Locale::Spanish => "Spanish",
            Locale::German => "German",
            Locale::Italian => "Italian",
            Locale::Portuguese => "Portuguese",
        }
    }

    /// Position of this locale in [`SUPPORTED_LOCALES`].
    pub fn index(&self) -> usize {
        SUPPORTED_LOCALES
            .iter()
            .position(|locale| locale == self)
            .unwrap_or(0)
    }

    /// The system prompt the agent is built with for this locale.
    pub fn system_prompt(&self) -> &'static str {
        system_prompt_for(self.name())
    }
}

/// Looks a prompt up by locale name, falling back to the default locale's
/// prompt. Never fails.
pub fn system_prompt_for(name: &str) -> &'static str {
    let lookup = |wanted: &str| {
        LANGUAGE_PROMPTS
            .iter()
            .find(|(key, _)| *key == wanted)
            .map(|(_, prompt)| *prompt)
    };
    lookup(name)
        .or_else(|| lookup(DEFAULT_LOCALE.name()))
        .unwrap_or(LANGUAGE_PROMPTS[0].1)
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SUPPORTED_LOCALES
            .iter()
            .copied()
            .find(|locale| locale.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLocale(s.to_string()))
    }
}
