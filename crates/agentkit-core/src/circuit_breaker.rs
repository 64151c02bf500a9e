//! Circuit breaker
//!
//! Tracks consecutive failures for a single dependency. Once the failure
//! threshold is reached the breaker opens and the dependency should be
//! skipped. The breaker closes again lazily: the first check after the
//! reset window has elapsed transitions it back to closed and clears the
//! failure count. There is no background timer and no half-open probe;
//! callers drive the clock by passing the current time into each call.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Configuration for a circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens
    pub failure_threshold: u32,
    /// How long the breaker stays open before it auto-closes
    pub reset_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_window: Duration::seconds(300),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the reset window
    #[must_use]
    pub fn with_reset_window(mut self, window: Duration) -> Self {
        self.reset_window = window;
        self
    }
}

/// Consecutive-failure circuit breaker for a single named dependency
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    failure_count: u32,
    opened_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    /// Create a new breaker
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            failure_count: 0,
            opened_at: None,
        }
    }

    /// Create with the default configuration
    #[must_use]
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Breaker name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current consecutive-failure count
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Whether the breaker is open at `now`.
    ///
    /// If the reset window has elapsed since the breaker opened, this call
    /// closes it and resets the failure count as a side effect.
    pub fn is_open(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(opened_at) = self.opened_at {
            if now - opened_at > self.config.reset_window {
                info!(name = %self.name, "circuit breaker reset window elapsed, closing");
                self.opened_at = None;
                self.failure_count = 0;
                return false;
            }
            return true;
        }
        false
    }

    /// Record a successful call, clearing the failure count
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.opened_at = None;
    }

    /// Record a failed call at `now`. Opens the breaker when the
    /// consecutive-failure count reaches the threshold.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.failure_count += 1;
        debug!(
            name = %self.name,
            failures = self.failure_count,
            threshold = self.config.failure_threshold,
            "circuit breaker failure recorded"
        );

        if self.opened_at.is_none() && self.failure_count >= self.config.failure_threshold {
            info!(
                name = %self.name,
                failures = self.failure_count,
                "circuit breaker opened"
            );
            self.opened_at = Some(now);
        }
    }

    /// Force the breaker closed and clear all counters
    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.opened_at = None;
    }
}
