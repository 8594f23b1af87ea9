use std::env;

use log::debug;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_FILE_SIZE_MB: u32 = 200;

const MAX_TEMPERATURE: f32 = 2.0;
const MAX_FILE_SIZE_LIMIT_MB: u32 = 500;
const MIN_API_KEY_LEN: usize = 20;

/// Raised when an environment value falls outside its declared bounds.
/// Fatal at startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl ConfigError {
    fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Runtime settings read from the environment.
///
/// A missing API key is a valid state: the app runs and reports that the
/// chatbot is unavailable until a key is provided.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub temperature: f32,
    pub max_file_size_mb: u32,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.into(),
            openai_base_url: DEFAULT_BASE_URL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            debug: false,
        }
    }
}

impl Settings {
    /// Loads `.env` (if present) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment overrides from {}", path.display()),
            Err(err) if err.not_found() => {}
            Err(err) => debug!("Ignoring unreadable .env file: {}", err),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if let Some(key) = &openai_api_key
            && key.chars().count() < MIN_API_KEY_LEN
        {
            return Err(ConfigError::validation(
                "OPENAI_API_KEY",
                format!("must be at least {MIN_API_KEY_LEN} characters"),
            ));
        }

        let openai_model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        let openai_base_url =
            lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let temperature = match lookup("OPENAI_TEMPERATURE") {
            Some(raw) => raw.trim().parse::<f32>().map_err(|_| {
                ConfigError::validation("OPENAI_TEMPERATURE", format!("'{raw}' is not a number"))
            })?,
            None => DEFAULT_TEMPERATURE,
        };
        if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(ConfigError::validation(
                "OPENAI_TEMPERATURE",
                format!("{temperature} is outside 0.0..={MAX_TEMPERATURE}"),
            ));
        }

        let max_file_size_mb = match lookup("MAX_FILE_SIZE_MB") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                ConfigError::validation("MAX_FILE_SIZE_MB", format!("'{raw}' is not an integer"))
            })?,
            None => i64::from(DEFAULT_MAX_FILE_SIZE_MB),
        };
        if max_file_size_mb <= 0 || max_file_size_mb > i64::from(MAX_FILE_SIZE_LIMIT_MB) {
            return Err(ConfigError::validation(
                "MAX_FILE_SIZE_MB",
                format!("{max_file_size_mb} is outside 1..={MAX_FILE_SIZE_LIMIT_MB}"),
            ));
        }

        let debug = lookup("DEBUG")
            .map(|raw| raw.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            openai_api_key,
            openai_model,
            openai_base_url,
            temperature,
            max_file_size_mb: max_file_size_mb as u32,
            debug,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        u64::from(self.max_file_size_mb) * 1024 * 1024
    }
}
