//! Cost estimation and the daily budget gate
//!
//! Cost is estimated, not measured: the estimate charges a fixed input
//! overhead plus the requested token ceiling against a static per-provider
//! rate. The daily budget is a single global dollar ceiling that rolls over
//! lazily when the wall-clock date advances past the stored reset date.

use crate::provider::Provider;
use chrono::NaiveDate;
use serde::Serialize;

/// Fixed input-token overhead charged per request
const INPUT_TOKEN_OVERHEAD: u32 = 500;

/// Anthropic cost per 1M tokens (USD)
const ANTHROPIC_COST_PER_MILLION: f64 = 3.00;
/// Gemini cost per 1M tokens (USD)
const GEMINI_COST_PER_MILLION: f64 = 1.25;
/// Perplexity cost per 1M tokens (USD)
const PERPLEXITY_COST_PER_MILLION: f64 = 1.00;
/// OpenAI cost per 1M tokens (USD)
const OPENAI_COST_PER_MILLION: f64 = 2.50;

/// Static per-provider rate (USD per 1M tokens)
#[must_use]
pub fn cost_per_million_tokens(provider: Provider) -> f64 {
    match provider {
        Provider::Anthropic => ANTHROPIC_COST_PER_MILLION,
        Provider::Gemini => GEMINI_COST_PER_MILLION,
        Provider::Perplexity => PERPLEXITY_COST_PER_MILLION,
        Provider::OpenAi => OPENAI_COST_PER_MILLION,
    }
}

/// Estimated cost in USD for one call with the given response ceiling
#[must_use]
pub fn estimate_cost(provider: Provider, max_tokens: u32) -> f64 {
    let estimated_tokens = u64::from(INPUT_TOKEN_OVERHEAD) + u64::from(max_tokens);
    (estimated_tokens as f64 / 1_000_000.0) * cost_per_million_tokens(provider)
}

/// Format a dollar amount the way reports display it
#[must_use]
pub fn format_usd(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Global daily spend tracker with lazy date rollover
#[derive(Debug, Clone, Serialize)]
pub struct DailyBudget {
    used: f64,
    limit: f64,
    reset_date: NaiveDate,
}

impl DailyBudget {
    /// Create a budget with the given daily ceiling, starting fresh today
    #[must_use]
    pub fn new(limit: f64, today: NaiveDate) -> Self {
        Self {
            used: 0.0,
            limit,
            reset_date: today,
        }
    }

    /// Roll the counter over if the date has advanced past the reset date.
    /// Called lazily on every budget query; there is no background timer.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if today > self.reset_date {
            self.used = 0.0;
            self.reset_date = today;
        }
    }

    /// Whether spending `cost` would exceed the ceiling as of `today`
    pub fn would_exceed(&mut self, cost: f64, today: NaiveDate) -> bool {
        self.roll_over(today);
        self.used + cost > self.limit
    }

    /// Record spend against today's counter
    pub fn record(&mut self, cost: f64) {
        self.used += cost;
    }

    /// Spend so far today (USD)
    #[must_use]
    pub fn used(&self) -> f64 {
        self.used
    }

    /// Daily ceiling (USD)
    #[must_use]
    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// Remaining budget (USD), clamped at zero
    #[must_use]
    pub fn remaining(&self) -> f64 {
        (self.limit - self.used).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[test]
    fn test_estimate_includes_input_overhead() {
        // 500 overhead + 1000 requested = 1500 tokens at $3.00/1M
        let cost = estimate_cost(Provider::Anthropic, 1000);
        assert!((cost - 0.0045).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_varies_by_provider() {
        let anthropic = estimate_cost(Provider::Anthropic, 4096);
        let perplexity = estimate_cost(Provider::Perplexity, 4096);
        assert!(anthropic > perplexity);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(1.2345), "$1.23");
        assert_eq!(format_usd(10.0), "$10.00");
    }

    #[test]
    fn test_budget_blocks_over_limit() {
        let mut budget = DailyBudget::new(1.0, today());
        assert!(!budget.would_exceed(0.5, today()));

        budget.record(0.9);
        assert!(budget.would_exceed(0.5, today()));
        assert!(!budget.would_exceed(0.05, today()));
    }

    #[test]
    fn test_budget_rolls_over_on_date_advance() {
        let yesterday = today().pred_opt().unwrap();
        let mut budget = DailyBudget::new(1.0, yesterday);
        budget.record(1.0);
        assert!(budget.would_exceed(0.5, yesterday));

        // Next day: counter resets lazily on the query itself
        assert!(!budget.would_exceed(0.5, today()));
        assert_eq!(budget.used(), 0.0);
    }

    #[test]
    fn test_remaining_clamped_at_zero() {
        let mut budget = DailyBudget::new(1.0, today());
        budget.record(2.0);
        assert_eq!(budget.remaining(), 0.0);
    }
}
