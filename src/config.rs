//! Session configuration

use serde::Deserialize;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REPLY_DELAY_MS: u64 = 2000;
pub const DEFAULT_REPLY_TEXT: &str = "Thanks for your message! I'll get back to you soon.";

const ENV_REPLY_DELAY_MS: &str = "GLASS_CHAT_REPLY_DELAY_MS";
const ENV_REPLY_TEXT: &str = "GLASS_CHAT_REPLY_TEXT";
const ENV_DIRECTORY: &str = "GLASS_CHAT_DIRECTORY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid GLASS_CHAT_REPLY_DELAY_MS value {value:?}: {source}")]
    InvalidDelay {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Reply text must not be empty")]
    EmptyReplyText,
}

/// Tunables for the simulated counterpart
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ChatConfigFields")]
pub struct ChatConfig {
    /// Delay between a committed message and the counterpart's reply
    pub reply_delay_ms: u64,
    /// Text of every simulated reply
    pub reply_text: String,
    /// Optional JSON contacts file replacing the built-in sample directory
    pub directory_path: Option<PathBuf>,
}

/// Deserialized form of `ChatConfig`, checked by `validate` before use
#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChatConfigFields {
    reply_delay_ms: u64,
    reply_text: String,
    directory_path: Option<PathBuf>,
}

impl Default for ChatConfigFields {
    fn default() -> Self {
        let ChatConfig {
            reply_delay_ms,
            reply_text,
            directory_path,
        } = ChatConfig::default();
        Self {
            reply_delay_ms,
            reply_text,
            directory_path,
        }
    }
}

impl TryFrom<ChatConfigFields> for ChatConfig {
    type Error = ConfigError;

    fn try_from(fields: ChatConfigFields) -> Result<Self, Self::Error> {
        let config = Self {
            reply_delay_ms: fields.reply_delay_ms,
            reply_text: fields.reply_text,
            directory_path: fields.directory_path,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: DEFAULT_REPLY_DELAY_MS,
            reply_text: DEFAULT_REPLY_TEXT.to_string(),
            directory_path: None,
        }
    }
}

impl ChatConfig {
    /// Read configuration from `GLASS_CHAT_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to
    /// defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_REPLY_DELAY_MS) {
            config.reply_delay_ms = value
                .trim()
                .parse::<u64>()
                .map_err(|source| ConfigError::InvalidDelay { value, source })?;
        }
        if let Some(text) = lookup(ENV_REPLY_TEXT) {
            config.reply_text = text;
        }
        config.directory_path = lookup(ENV_DIRECTORY)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reply_text.trim().is_empty() {
            return Err(ConfigError::EmptyReplyText);
        }
        Ok(())
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    #[allow(dead_code)] // Builder for embedding and tests
    #[must_use]
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn with_reply_text(mut self, text: impl Into<String>) -> Self {
        self.reply_text = text.into();
        self
    }
}
