//! Error types for agentkit-llm

use crate::provider::Provider;
use thiserror::Error;

/// LLM routing error type
#[derive(Debug, Error)]
pub enum Error {
    /// Every provider is disabled, breaker-open, or rate-limited
    #[error("no available LLM provider")]
    NoProviderAvailable,

    /// Daily cost ceiling reached before the call was attempted
    #[error("daily budget exceeded: ${used:.2} / ${limit:.2} (increase LLM_DAILY_MAX_COST_USD or wait for the daily rollover)")]
    BudgetExceeded {
        /// Estimated spend so far today (USD)
        used: f64,
        /// Configured daily ceiling (USD)
        limit: f64,
    },

    /// Retries and fallback across every available provider were exhausted
    #[error("all providers failed; last failed: {last}")]
    AllProvidersFailed {
        /// The provider whose failure ended the fallback chain
        last: Provider,
    },

    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}s")]
    Timeout(u64),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
