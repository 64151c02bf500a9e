//! Provider client seam
//!
//! Each provider implements exactly one capability: issue a single
//! generation request and return text or fail with a transport error.
//! Everything else (selection, retries, fallback, budgets) lives in the
//! router on the other side of this trait.

use crate::error::Result;
use crate::provider::Provider;

/// One generation request, fully resolved by the router
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier to pass through to the provider
    pub model: String,
    /// User prompt
    pub prompt: String,
    /// Optional system prompt
    pub system_prompt: Option<String>,
    /// Token ceiling for the response
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// A client capable of one request/response generation call
#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    /// Which provider this client talks to
    fn provider(&self) -> Provider;

    /// Issue one generation call and return the generated text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
