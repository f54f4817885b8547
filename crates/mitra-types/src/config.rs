//! Global configuration types for Mitra.
//!
//! `GlobalConfig` represents the top-level `config.toml` that selects the
//! chat backend and tunes the conversation view.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::chat::DEFAULT_GREETING;

/// Which chat backend the transport adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Webhook-addressed hosted chat API.
    Hosted,
    /// Local responder with canned replies.
    Mock,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Hosted => write!(f, "hosted"),
            BackendKind::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hosted" => Ok(BackendKind::Hosted),
            "mock" => Ok(BackendKind::Mock),
            other => Err(format!("invalid backend: '{other}'")),
        }
    }
}

/// Top-level configuration for the chat client.
///
/// Loaded from `~/.mitra/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Webhook id of the hosted bot.
    #[serde(default = "default_webhook_id")]
    pub webhook_id: String,

    /// Base URL of the hosted chat API (the webhook id is appended).
    #[serde(default = "default_chat_api_base_url")]
    pub chat_api_base_url: String,

    /// Hard limit on how long a send waits for the bot's reply.
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,

    /// Artificial latency of the mock backend.
    #[serde(default = "default_mock_reply_delay_ms")]
    pub mock_reply_delay_ms: u64,

    /// Label shown next to bot messages.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Text of the canned greeting.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_backend() -> BackendKind {
    BackendKind::Hosted
}

fn default_webhook_id() -> String {
    "87359b9f-23d2-4961-aa37-16967b80ac34".to_string()
}

fn default_chat_api_base_url() -> String {
    "https://chat.botpress.cloud".to_string()
}

fn default_reply_timeout_secs() -> u64 {
    30
}

fn default_mock_reply_delay_ms() -> u64 {
    800
}

fn default_assistant_name() -> String {
    "KIIT Assistant".to_string()
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            webhook_id: default_webhook_id(),
            chat_api_base_url: default_chat_api_base_url(),
            reply_timeout_secs: default_reply_timeout_secs(),
            mock_reply_delay_ms: default_mock_reply_delay_ms(),
            assistant_name: default_assistant_name(),
            greeting: default_greeting(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.backend, BackendKind::Hosted);
        assert_eq!(config.reply_timeout_secs, 30);
        assert_eq!(config.greeting, DEFAULT_GREETING);
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.reply_timeout_secs, 30);
        assert_eq!(config.assistant_name, "KIIT Assistant");
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
backend = "mock"
webhook_id = "abc"
reply_timeout_secs = 5
mock_reply_delay_ms = 10
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.webhook_id, "abc");
        assert_eq!(config.reply_timeout_secs, 5);
        assert_eq!(config.mock_reply_delay_ms, 10);
    }

    #[test]
    fn test_backend_kind_roundtrip() {
        for kind in [BackendKind::Hosted, BackendKind::Mock] {
            let parsed: BackendKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert!("carrier-pigeon".parse::<BackendKind>().is_err());
    }
}
