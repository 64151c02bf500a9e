//! LLM provider routing for agentkit
//!
//! A single router fronts every text-generation call the kit makes. It picks
//! a provider from a configurable priority order, enforces the cost and
//! reliability gates (daily budget, per-minute rate shaping, per-provider
//! circuit breakers), retries with backoff, and falls back across providers
//! when one keeps failing. Dry-run mode, on by default, answers every
//! request with a deterministic mock so full workflows run end to end at
//! zero cost.
//!
//! # Example
//!
//! ```no_run
//! use agentkit_llm::{GenerateRequest, LlmRouter, TaskType};
//!
//! # async fn demo() -> agentkit_llm::Result<()> {
//! let router = LlmRouter::from_env();
//! let result = router
//!     .generate(
//!         GenerateRequest::new("What changed in Rust 1.75?")
//!             .with_task_type(TaskType::Search),
//!     )
//!     .await?;
//! println!("{} answered: {}", result.provider, result.text);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod client;
pub mod cost;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod perplexity;
pub mod provider;
pub mod router;
pub mod util;

pub use client::{GenerationClient, GenerationRequest};
pub use cost::{cost_per_million_tokens, estimate_cost, format_usd, DailyBudget};
pub use error::{Error, Result};
pub use provider::{load_provider_settings, Provider, ProviderSettings};
pub use router::{
    reset_shared_router, shared_router, GenerateRequest, Generation, LlmRouter, RouterConfig,
    TaskType, UsageEvent, UsageReport,
};
