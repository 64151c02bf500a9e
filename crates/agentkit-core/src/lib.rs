//! Agentkit Core - shared primitives
//!
//! This crate provides the fault-tolerance building blocks used by the
//! agentkit LLM router:
//! - Circuit breaker: excludes a dependency after repeated consecutive failures
//! - Rate window: sliding-window request counting for best-effort load shaping

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod rate_window;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use rate_window::RateWindow;
