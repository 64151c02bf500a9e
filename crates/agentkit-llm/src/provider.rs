//! Provider identity and per-provider settings
//!
//! The provider set is closed: an invalid provider name is a parse error at
//! the edge, never a silent miss inside the router.

use crate::util::mask_api_key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Default requests-per-minute ceiling per provider
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// A text-generation backend the router can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Anthropic Claude
    Anthropic,
    /// Google Gemini
    Gemini,
    /// Perplexity (search-affinity provider)
    Perplexity,
    /// OpenAI (opt-in gated, disabled unless explicitly enabled)
    OpenAi,
}

impl Provider {
    /// Every provider, in default priority order with OpenAI last
    pub const ALL: [Provider; 4] = [
        Provider::Anthropic,
        Provider::Gemini,
        Provider::Perplexity,
        Provider::OpenAi,
    ];

    /// String tag used in configuration and logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Perplexity => "perplexity",
            Self::OpenAi => "openai",
        }
    }

    /// Environment variable prefix for this provider
    fn env_prefix(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC",
            Self::Gemini => "GEMINI",
            Self::Perplexity => "PERPLEXITY",
            Self::OpenAi => "OPENAI",
        }
    }

    /// Default model identifier
    fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::Gemini => "gemini-1.5-pro",
            Self::Perplexity => "llama-3.1-sonar-large-128k-online",
            Self::OpenAi => "gpt-4",
        }
    }

    /// Default per-request token ceiling
    fn default_max_tokens(&self) -> u32 {
        match self {
            Self::Gemini => 8192,
            _ => 4096,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "gemini" => Ok(Self::Gemini),
            "perplexity" => Ok(Self::Perplexity),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Static configuration for one provider
#[derive(Clone)]
pub struct ProviderSettings {
    /// API key, if configured. Presence gates structural availability.
    pub api_key: Option<String>,
    /// Model identifier passed to the provider call
    pub model: String,
    /// Default per-request token ceiling when the caller omits one
    pub max_tokens: u32,
    /// Requests-per-minute ceiling used by the rate-limit gate
    pub requests_per_minute: u32,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field(
                "api_key",
                &self.api_key.as_deref().map(mask_api_key),
            )
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

impl ProviderSettings {
    /// Built-in defaults for a provider, with no credential configured
    #[must_use]
    pub fn defaults(provider: Provider) -> Self {
        Self {
            api_key: None,
            model: provider.default_model().to_string(),
            max_tokens: provider.default_max_tokens(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }

    /// Load settings for one provider from `{PREFIX}_API_KEY`,
    /// `{PREFIX}_MODEL`, `{PREFIX}_MAX_TOKENS`, and
    /// `{PREFIX}_REQUESTS_PER_MINUTE`.
    #[must_use]
    pub fn from_env(provider: Provider) -> Self {
        let prefix = provider.env_prefix();

        let api_key = std::env::var(format!("{prefix}_API_KEY"))
            .ok()
            .filter(|key| !key.is_empty());
        let model = std::env::var(format!("{prefix}_MODEL"))
            .unwrap_or_else(|_| provider.default_model().to_string());
        let max_tokens = std::env::var(format!("{prefix}_MAX_TOKENS"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| provider.default_max_tokens());
        let requests_per_minute = std::env::var(format!("{prefix}_REQUESTS_PER_MINUTE"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE);

        Self {
            api_key,
            model,
            max_tokens,
            requests_per_minute,
        }
    }

    /// Whether a credential is present
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Load settings for every provider from the environment
#[must_use]
pub fn load_provider_settings() -> HashMap<Provider, ProviderSettings> {
    Provider::ALL
        .into_iter()
        .map(|provider| (provider, ProviderSettings::from_env(provider)))
        .collect()
}
