//! LLM Router - provider selection and request routing
//!
//! The router is the single point of indirection between "I need N tokens of
//! text for purpose P" and "here is some text, or an error". It owns:
//! - the provider priority list and availability model
//! - the policy gates (daily budget, per-minute rate shaping, circuit breaker)
//! - the generate loop: dry-run short-circuit, bounded retries with backoff,
//!   timeout enforcement, and iterative fallback across providers
//! - usage-statistics accounting
//!
//! Dry-run is a first-class operating mode, not a debug shim: with
//! `DRY_RUN=true` (the default) the router returns a deterministic mock
//! response without touching the network or any cost counter, through the
//! same result shape as the real path.

use crate::anthropic::AnthropicClient;
use crate::client::{GenerationClient, GenerationRequest};
use crate::cost::{estimate_cost, format_usd, DailyBudget};
use crate::error::{Error, Result};
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use crate::perplexity::PerplexityClient;
use crate::provider::{load_provider_settings, Provider, ProviderSettings};
use crate::util::truncate_chars;
use agentkit_core::{CircuitBreaker, RateWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Usage-history ring capacity
const USAGE_HISTORY_CAPACITY: usize = 1000;

/// Prompt prefix length echoed by the dry-run mock
const MOCK_PROMPT_PREFIX_CHARS: usize = 80;

/// Default sampling temperature
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default daily budget ceiling (USD)
const DEFAULT_DAILY_MAX_COST_USD: f64 = 10.0;

/// Default number of attempts against the selected provider
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-call timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Backoff delays between retry attempts, clamped to the last element
const RETRY_DELAYS_SECS: [u64; 3] = [2, 4, 8];

// ============================================================================
// Task Type
// ============================================================================

/// Task-type hint supplied by the calling agent.
///
/// Only `Search` affects routing (it pulls requests toward the
/// search-affinity provider); the rest are carried for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Live search / research query
    Search,
    /// Free-form content generation
    Generate,
    /// Analysis of existing data
    Analyze,
    /// Scheduling and planning
    Schedule,
    /// Compliance checking
    Compliance,
    /// Action execution
    Execute,
}

impl TaskType {
    /// String tag used in logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Generate => "generate",
            Self::Analyze => "analyze",
            Self::Schedule => "schedule",
            Self::Compliance => "compliance",
            Self::Execute => "execute",
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Router configuration, normally loaded from the environment once at
/// construction
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Provider preference order
    pub priority: Vec<Provider>,
    /// Whether the opt-in-gated OpenAI provider may ever be selected
    pub enable_openai: bool,
    /// Simulation mode: never call the network, return mock responses
    pub dry_run: bool,
    /// Reserve Perplexity for search tasks only
    pub perplexity_search_only: bool,
    /// Global daily spend ceiling (USD)
    pub daily_max_cost_usd: f64,
    /// Attempts against the selected provider before falling back
    pub max_retries: u32,
    /// Per-call timeout
    pub timeout: Duration,
    /// Backoff delays between attempts, clamped to the last element
    pub retry_delays: Vec<Duration>,
    /// Per-provider settings
    pub providers: HashMap<Provider, ProviderSettings>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            priority: vec![Provider::Anthropic, Provider::Gemini, Provider::Perplexity],
            enable_openai: false,
            // Cost-safety default: simulate unless explicitly switched off
            dry_run: true,
            perplexity_search_only: true,
            daily_max_cost_usd: DEFAULT_DAILY_MAX_COST_USD,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_delays: RETRY_DELAYS_SECS
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
            providers: Provider::ALL
                .into_iter()
                .map(|provider| (provider, ProviderSettings::defaults(provider)))
                .collect(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from the environment.
    ///
    /// Recognized variables: `LLM_PRIORITY`, `OPENAI_ENABLED`, `DRY_RUN`,
    /// `PERPLEXITY_SEARCH_ONLY`, `LLM_DAILY_MAX_COST_USD`,
    /// `LLM_MAX_RETRIES`, `LLM_TIMEOUT_SECS`, plus the per-provider
    /// variables documented on [`ProviderSettings::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let priority = std::env::var("LLM_PRIORITY")
            .ok()
            .map(|raw| parse_priority(&raw))
            .filter(|parsed| !parsed.is_empty())
            .unwrap_or(defaults.priority);

        Self {
            priority,
            enable_openai: env_flag("OPENAI_ENABLED", false),
            dry_run: env_flag("DRY_RUN", true),
            perplexity_search_only: env_flag("PERPLEXITY_SEARCH_ONLY", true),
            daily_max_cost_usd: env_parse("LLM_DAILY_MAX_COST_USD", DEFAULT_DAILY_MAX_COST_USD),
            max_retries: env_parse("LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            timeout: Duration::from_secs(env_parse("LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
            retry_delays: defaults.retry_delays,
            providers: load_provider_settings(),
        }
    }
}

/// Parse a comma-separated priority list, skipping unknown names
pub(crate) fn parse_priority(raw: &str) -> Vec<Provider> {
    let mut parsed = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match Provider::from_str(entry) {
            Ok(provider) => {
                if !parsed.contains(&provider) {
                    parsed.push(provider);
                }
            }
            Err(err) => warn!(entry, %err, "ignoring unknown provider in LLM_PRIORITY"),
        }
    }
    parsed
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => {
            let value = value.trim().to_ascii_lowercase();
            value == "true" || value == "1"
        }
        Err(_) => default,
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Request / Result types
// ============================================================================

/// A generation request as agents issue it
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// User prompt
    pub prompt: String,
    /// Token ceiling; the selected provider's default applies when omitted
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: f32,
    /// Optional system prompt
    pub system_prompt: Option<String>,
    /// Soft preference for one provider
    pub preferred_provider: Option<Provider>,
    /// Task-type hint
    pub task_type: Option<TaskType>,
}

impl GenerateRequest {
    /// Create a request with defaults
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: None,
            preferred_provider: None,
            task_type: None,
        }
    }

    /// Set the token ceiling
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the system prompt
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Prefer a specific provider
    #[must_use]
    pub fn with_preferred_provider(mut self, provider: Provider) -> Self {
        self.preferred_provider = Some(provider);
        self
    }

    /// Set the task-type hint
    #[must_use]
    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = Some(task_type);
        self
    }
}

/// A successful generation
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    /// Provider that produced the text
    pub provider: Provider,
    /// Generated text (or dry-run mock)
    pub text: String,
    /// When the result was produced
    pub timestamp: DateTime<Utc>,
    /// Failed attempts that preceded this result
    pub retries: u32,
    /// Estimated cost in USD (zero in dry-run mode)
    pub estimated_cost: f64,
    /// Set when this result came from a fallback provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_from: Option<Provider>,
}

impl Generation {
    /// Estimated cost formatted the way reports display it (e.g. `$0.00`)
    #[must_use]
    pub fn cost_display(&self) -> String {
        format_usd(self.estimated_cost)
    }
}

/// One entry in the usage-history ring. Inspection only; never consulted by
/// routing decisions.
#[derive(Debug, Clone, Serialize)]
pub struct UsageEvent {
    /// Provider that was called
    pub provider: Provider,
    /// When the call finished
    pub timestamp: DateTime<Utc>,
    /// Whether the call succeeded
    pub success: bool,
}

/// Aggregated usage report
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    /// Total successful calls across all providers
    pub total_requests: u64,
    /// Successful calls per provider
    pub by_provider: HashMap<Provider, u64>,
    /// Providers currently structurally available, in priority order
    pub available_providers: Vec<Provider>,
    /// Current priority order
    pub priority: Vec<Provider>,
    /// Whether the router is in dry-run mode
    pub dry_run: bool,
    /// Estimated spend so far today, formatted
    pub daily_cost_used: String,
    /// Remaining daily budget, formatted
    pub daily_budget_remaining: String,
}

// ============================================================================
// Router
// ============================================================================

struct RouterState {
    priority: Vec<Provider>,
    enable_openai: bool,
    usage_stats: HashMap<Provider, u64>,
    usage_history: VecDeque<UsageEvent>,
    request_windows: HashMap<Provider, RateWindow>,
    breakers: HashMap<Provider, CircuitBreaker>,
    budget: DailyBudget,
}

impl RouterState {
    fn new(priority: Vec<Provider>, enable_openai: bool, daily_max_cost_usd: f64) -> Self {
        Self {
            priority,
            enable_openai,
            usage_stats: HashMap::new(),
            usage_history: VecDeque::with_capacity(USAGE_HISTORY_CAPACITY),
            request_windows: Provider::ALL
                .into_iter()
                .map(|provider| (provider, RateWindow::default()))
                .collect(),
            breakers: Provider::ALL
                .into_iter()
                .map(|provider| (provider, CircuitBreaker::with_defaults(provider.as_str())))
                .collect(),
            budget: DailyBudget::new(daily_max_cost_usd, Utc::now().date_naive()),
        }
    }

    fn push_history(&mut self, event: UsageEvent) {
        if self.usage_history.len() == USAGE_HISTORY_CAPACITY {
            self.usage_history.pop_front();
        }
        self.usage_history.push_back(event);
    }
}

/// The LLM Router.
///
/// One instance per process is the intended shape (see [`shared_router`]);
/// construct explicitly and inject where composition allows it. All mutable
/// state sits behind a single lock so concurrent `generate` calls from many
/// agents stay coherent.
pub struct LlmRouter {
    settings: HashMap<Provider, ProviderSettings>,
    clients: HashMap<Provider, Arc<dyn GenerationClient>>,
    dry_run: bool,
    perplexity_search_only: bool,
    max_retries: u32,
    timeout: Duration,
    retry_delays: Vec<Duration>,
    state: Mutex<RouterState>,
}

impl LlmRouter {
    /// Create a router from a configuration and a set of provider clients.
    /// Each client is registered under the provider it reports via
    /// [`GenerationClient::provider`].
    ///
    /// The opt-in-gated provider is stripped from the priority list here,
    /// exactly once, when opt-in is not granted.
    #[must_use]
    pub fn new(config: RouterConfig, clients: Vec<Arc<dyn GenerationClient>>) -> Self {
        let clients: HashMap<Provider, Arc<dyn GenerationClient>> = clients
            .into_iter()
            .map(|client| (client.provider(), client))
            .collect();
        let mut priority = config.priority;
        if !config.enable_openai && priority.contains(&Provider::OpenAi) {
            priority.retain(|provider| *provider != Provider::OpenAi);
            info!("openai is disabled and removed from the priority list");
        }

        info!(
            priority = ?priority,
            dry_run = config.dry_run,
            openai_enabled = config.enable_openai,
            "llm router initialized"
        );

        Self {
            settings: config.providers,
            clients,
            dry_run: config.dry_run,
            perplexity_search_only: config.perplexity_search_only,
            max_retries: config.max_retries.max(1),
            timeout: config.timeout,
            retry_delays: config.retry_delays,
            state: Mutex::new(RouterState::new(
                priority,
                config.enable_openai,
                config.daily_max_cost_usd,
            )),
        }
    }

    /// Create a router from the environment, building an HTTP client for
    /// every provider with a configured credential.
    #[must_use]
    pub fn from_env() -> Self {
        let config = RouterConfig::from_env();
        let clients = default_clients(&config);
        Self::new(config, clients)
    }

    /// Whether the router is in dry-run mode
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn settings_for(&self, provider: Provider) -> Result<&ProviderSettings> {
        self.settings
            .get(&provider)
            .ok_or_else(|| Error::NotConfigured(provider.to_string()))
    }

    /// Structural availability: credential present, and the opt-in gate
    /// granted for the gated provider
    fn is_available(&self, state: &RouterState, provider: Provider) -> bool {
        let has_credentials = self
            .settings
            .get(&provider)
            .is_some_and(ProviderSettings::has_credentials);
        has_credentials && (provider != Provider::OpenAi || state.enable_openai)
    }

    fn available_in(&self, state: &RouterState) -> Vec<Provider> {
        state
            .priority
            .iter()
            .copied()
            .filter(|provider| self.is_available(state, *provider))
            .collect()
    }

    /// Providers currently structurally available, in priority order
    pub async fn available_providers(&self) -> Vec<Provider> {
        let state = self.state.lock().await;
        self.available_in(&state)
    }

    /// Select exactly one provider for a request, or none.
    ///
    /// Preference and search affinity are soft hints that still respect the
    /// hard gates (opt-in, search-only restriction, circuit breaker);
    /// priority order is the final tie-break among the rest, with
    /// breaker-open and rate-saturated providers excluded.
    pub async fn select_provider(
        &self,
        preferred: Option<Provider>,
        task_type: Option<TaskType>,
    ) -> Option<Provider> {
        let mut state = self.state.lock().await;
        self.select_in(&mut state, preferred, task_type, Utc::now())
    }

    fn select_in(
        &self,
        state: &mut RouterState,
        preferred: Option<Provider>,
        task_type: Option<TaskType>,
        now: DateTime<Utc>,
    ) -> Option<Provider> {
        let is_search = task_type == Some(TaskType::Search);

        if let Some(preferred) = preferred {
            let opt_in_blocked = preferred == Provider::OpenAi && !state.enable_openai;
            let search_only_blocked = preferred == Provider::Perplexity
                && self.perplexity_search_only
                && !is_search;
            let breaker_open = state
                .breakers
                .get_mut(&preferred)
                .is_some_and(|breaker| breaker.is_open(now));

            if !opt_in_blocked
                && !search_only_blocked
                && !breaker_open
                && self.is_available(state, preferred)
            {
                info!(provider = %preferred, "using preferred provider");
                return Some(preferred);
            }
            warn!(provider = %preferred, "preferred provider not usable, falling back to priority");
        }

        // Search tasks go to the search-affinity provider ahead of priority
        // order, as long as it is available and its breaker is closed.
        if is_search
            && state.priority.contains(&Provider::Perplexity)
            && self.is_available(state, Provider::Perplexity)
        {
            let breaker_open = state
                .breakers
                .get_mut(&Provider::Perplexity)
                .is_some_and(|breaker| breaker.is_open(now));
            if !breaker_open {
                info!("routing search task to perplexity");
                return Some(Provider::Perplexity);
            }
        }

        let mut candidates = self.available_in(state);

        if self.perplexity_search_only && !is_search {
            candidates.retain(|provider| *provider != Provider::Perplexity);
        }

        candidates.retain(|provider| {
            !state
                .breakers
                .get_mut(provider)
                .is_some_and(|breaker| breaker.is_open(now))
        });

        candidates.retain(|provider| {
            let limit = self
                .settings
                .get(provider)
                .map_or(u32::MAX, |settings| settings.requests_per_minute);
            let saturated = state
                .request_windows
                .get_mut(provider)
                .is_some_and(|window| window.is_saturated(now, limit as usize));
            if saturated {
                debug!(provider = %provider, "provider over per-minute rate limit, skipping");
            }
            !saturated
        });

        let selected = candidates.first().copied();
        match selected {
            Some(provider) => {
                debug!(provider = %provider, candidates = candidates.len(), "provider selected")
            }
            None => warn!("no llm providers available"),
        }
        selected
    }

    /// Generate text.
    ///
    /// Selection, the dry-run short-circuit, the daily budget gate, the
    /// bounded retry loop, and provider fallback, in that order. Every
    /// failure path terminates in a typed error; this method never panics
    /// across its public boundary.
    #[instrument(skip(self, request), fields(task = ?request.task_type))]
    pub async fn generate(&self, request: GenerateRequest) -> Result<Generation> {
        let now = Utc::now();

        let (provider, max_tokens, estimated) = {
            let mut state = self.state.lock().await;
            let provider = self
                .select_in(&mut state, request.preferred_provider, request.task_type, now)
                .ok_or(Error::NoProviderAvailable)?;
            let settings = self.settings_for(provider)?;
            let max_tokens = request.max_tokens.unwrap_or(settings.max_tokens);

            if self.dry_run {
                // Hard short-circuit: no network, no budget, no counters.
                let text =
                    mock_response(provider, &settings.model, &request.prompt, request.task_type);
                debug!(provider = %provider, "dry-run mock response returned");
                return Ok(Generation {
                    provider,
                    text,
                    timestamp: now,
                    retries: 0,
                    estimated_cost: 0.0,
                    fallback_from: None,
                });
            }

            let estimated = estimate_cost(provider, max_tokens);
            if state.budget.would_exceed(estimated, now.date_naive()) {
                let used = state.budget.used();
                let limit = state.budget.limit();
                warn!(used, limit, "daily budget exhausted, rejecting request");
                return Err(Error::BudgetExceeded { used, limit });
            }

            (provider, max_tokens, estimated)
        };

        let mut attempts_used = 0;
        for attempt in 0..self.max_retries {
            match self.call_provider(provider, &request, max_tokens).await {
                Ok(text) => {
                    let timestamp = self.record_success(provider, estimated).await;
                    return Ok(Generation {
                        provider,
                        text,
                        timestamp,
                        retries: attempt,
                        estimated_cost: estimated,
                        fallback_from: None,
                    });
                }
                Err(err) => {
                    warn!(provider = %provider, attempt, error = %err, "provider call failed");
                    attempts_used = attempt + 1;
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(self.retry_delay(attempt)).await;
                    } else {
                        self.record_failure(provider).await;
                    }
                }
            }
        }

        self.fallback_generate(provider, &request, attempts_used).await
    }

    /// Try the remaining available providers, one direct attempt each, until
    /// one succeeds or the list is exhausted. An explicit loop rather than
    /// recursion, so a long provider list cannot grow the stack.
    async fn fallback_generate(
        &self,
        failed: Provider,
        request: &GenerateRequest,
        mut attempts: u32,
    ) -> Result<Generation> {
        let mut excluded: HashSet<Provider> = HashSet::from([failed]);
        let mut last_failed = failed;

        loop {
            let next = {
                let state = self.state.lock().await;
                self.available_in(&state)
                    .into_iter()
                    .find(|provider| !excluded.contains(provider))
            };
            let Some(next) = next else {
                warn!(last = %last_failed, "fallback exhausted all providers");
                return Err(Error::AllProvidersFailed { last: last_failed });
            };

            info!(failed = %last_failed, provider = %next, "trying fallback provider");
            let max_tokens = request
                .max_tokens
                .unwrap_or(self.settings_for(next)?.max_tokens);

            match self.call_provider(next, request, max_tokens).await {
                Ok(text) => {
                    let estimated = estimate_cost(next, max_tokens);
                    let timestamp = self.record_success(next, estimated).await;
                    return Ok(Generation {
                        provider: next,
                        text,
                        timestamp,
                        retries: attempts,
                        estimated_cost: estimated,
                        fallback_from: Some(failed),
                    });
                }
                Err(err) => {
                    warn!(provider = %next, error = %err, "fallback provider also failed");
                    self.record_failure(next).await;
                    excluded.insert(next);
                    last_failed = next;
                    attempts += 1;
                }
            }
        }
    }

    async fn call_provider(
        &self,
        provider: Provider,
        request: &GenerateRequest,
        max_tokens: u32,
    ) -> Result<String> {
        let client = self
            .clients
            .get(&provider)
            .ok_or_else(|| Error::NotConfigured(provider.to_string()))?
            .clone();
        let settings = self.settings_for(provider)?;

        let generation_request = GenerationRequest {
            model: settings.model.clone(),
            prompt: request.prompt.clone(),
            system_prompt: request.system_prompt.clone(),
            max_tokens,
            temperature: request.temperature,
        };

        match tokio::time::timeout(self.timeout, client.generate(&generation_request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout.as_secs())),
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let index = (attempt as usize).min(self.retry_delays.len().saturating_sub(1));
        self.retry_delays.get(index).copied().unwrap_or_default()
    }

    async fn record_success(&self, provider: Provider, estimated_cost: f64) -> DateTime<Utc> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        *state.usage_stats.entry(provider).or_insert(0) += 1;
        state.push_history(UsageEvent {
            provider,
            timestamp: now,
            success: true,
        });
        if let Some(window) = state.request_windows.get_mut(&provider) {
            window.record(now);
        }
        state.budget.roll_over(now.date_naive());
        state.budget.record(estimated_cost);
        if let Some(breaker) = state.breakers.get_mut(&provider) {
            breaker.record_success();
        }
        now
    }

    async fn record_failure(&self, provider: Provider) {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        state.push_history(UsageEvent {
            provider,
            timestamp: now,
            success: false,
        });
        if let Some(breaker) = state.breakers.get_mut(&provider) {
            breaker.record_failure(now);
        }
    }

    // ========================================================================
    // Administrative operations
    // ========================================================================

    /// Replace the priority order. The opt-in-gated provider is silently
    /// stripped when opt-in is not granted; duplicates are dropped.
    pub async fn set_priority(&self, priority: Vec<Provider>) {
        let mut state = self.state.lock().await;
        let mut filtered = Vec::with_capacity(priority.len());
        for provider in priority {
            if provider == Provider::OpenAi && !state.enable_openai {
                continue;
            }
            if !filtered.contains(&provider) {
                filtered.push(provider);
            }
        }
        info!(priority = ?filtered, "priority updated");
        state.priority = filtered;
    }

    /// Enable a provider: grants opt-in for the gated provider and adds the
    /// provider to the priority list if absent
    pub async fn enable_provider(&self, provider: Provider) {
        let mut state = self.state.lock().await;
        if provider == Provider::OpenAi {
            state.enable_openai = true;
        }
        if !state.priority.contains(&provider) {
            state.priority.push(provider);
        }
        info!(provider = %provider, "provider enabled");
    }

    /// Disable a provider: removes it from the priority list, and revokes
    /// opt-in for the gated provider
    pub async fn disable_provider(&self, provider: Provider) {
        let mut state = self.state.lock().await;
        state.priority.retain(|candidate| *candidate != provider);
        if provider == Provider::OpenAi {
            state.enable_openai = false;
        }
        info!(provider = %provider, "provider disabled");
    }

    /// Aggregated usage report
    pub async fn usage_report(&self) -> UsageReport {
        let mut state = self.state.lock().await;
        state.budget.roll_over(Utc::now().date_naive());

        let total_requests = state.usage_stats.values().sum();
        let by_provider = state.usage_stats.clone();
        let available_providers = self.available_in(&state);
        UsageReport {
            total_requests,
            by_provider,
            available_providers,
            priority: state.priority.clone(),
            dry_run: self.dry_run,
            daily_cost_used: format_usd(state.budget.used()),
            daily_budget_remaining: format_usd(state.budget.remaining()),
        }
    }

    /// Snapshot of the usage-history ring, oldest first
    pub async fn usage_history(&self) -> Vec<UsageEvent> {
        let state = self.state.lock().await;
        state.usage_history.iter().cloned().collect()
    }
}

/// Build real HTTP clients for every provider with a configured credential
fn default_clients(config: &RouterConfig) -> Vec<Arc<dyn GenerationClient>> {
    let mut clients: Vec<Arc<dyn GenerationClient>> = Vec::new();
    for (provider, settings) in &config.providers {
        let Some(api_key) = settings.api_key.clone() else {
            continue;
        };
        clients.push(match provider {
            Provider::Anthropic => Arc::new(AnthropicClient::new(api_key, config.timeout)),
            Provider::Gemini => Arc::new(GeminiClient::new(api_key, config.timeout)),
            Provider::Perplexity => Arc::new(PerplexityClient::new(api_key, config.timeout)),
            Provider::OpenAi => Arc::new(OpenAiClient::new(api_key, config.timeout)),
        });
    }
    clients
}

/// Deterministic mock response for dry-run mode
fn mock_response(
    provider: Provider,
    model: &str,
    prompt: &str,
    task_type: Option<TaskType>,
) -> String {
    let prefix = truncate_chars(prompt, MOCK_PROMPT_PREFIX_CHARS);
    if task_type == Some(TaskType::Search) {
        format!(
            "[dry-run] simulated search results from {provider} ({model}) for \"{prefix}\": \
             1) example finding A; 2) example finding B. \
             No API call was made; cost $0.00."
        )
    } else {
        format!(
            "[dry-run] {provider} ({model}) mock response to \"{prefix}\". \
             No API call was made; cost $0.00."
        )
    }
}

// ============================================================================
// Shared instance
// ============================================================================

lazy_static::lazy_static! {
    static ref SHARED_ROUTER: std::sync::Mutex<Option<Arc<LlmRouter>>> =
        std::sync::Mutex::new(None);
}

/// Get the process-wide shared router, constructing it from the environment
/// on first use
#[must_use]
pub fn shared_router() -> Arc<LlmRouter> {
    let mut slot = SHARED_ROUTER.lock().expect("shared router lock poisoned");
    slot.get_or_insert_with(|| Arc::new(LlmRouter::from_env()))
        .clone()
}

/// Clear the shared router so the next accessor constructs fresh state.
/// Test isolation only; must not race live traffic.
pub fn reset_shared_router() {
    let mut slot = SHARED_ROUTER.lock().expect("shared router lock poisoned");
    *slot = None;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct StubClient {
        provider: Provider,
        outcomes: std::sync::Mutex<VecDeque<Result<String>>>,
        calls: AtomicU32,
        hang: AtomicBool,
    }

    impl StubClient {
        fn new(provider: Provider) -> Arc<Self> {
            Arc::new(Self {
                provider,
                outcomes: std::sync::Mutex::new(VecDeque::new()),
                calls: AtomicU32::new(0),
                hang: AtomicBool::new(false),
            })
        }

        fn script(&self, outcome: Result<String>) {
            self.outcomes.lock().unwrap().push_back(outcome);
        }

        fn script_failures(&self, count: usize) {
            for _ in 0..count {
                self.script(Err(Error::Api("simulated failure".to_string())));
            }
        }

        fn set_hang(&self) {
            self.hang.store(true, Ordering::SeqCst);
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl GenerationClient for StubClient {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            match self.outcomes.lock().unwrap().pop_front() {
                Some(outcome) => outcome,
                None => Ok("stub response".to_string()),
            }
        }
    }

    fn keyed(provider: Provider) -> ProviderSettings {
        ProviderSettings {
            api_key: Some(format!("test-key-{provider}")),
            ..ProviderSettings::defaults(provider)
        }
    }

    fn test_config(keyed_providers: &[Provider]) -> RouterConfig {
        let mut config = RouterConfig {
            dry_run: false,
            timeout: Duration::from_secs(5),
            ..RouterConfig::default()
        };
        for provider in keyed_providers {
            config.providers.insert(*provider, keyed(*provider));
        }
        config
    }

    fn stub_router(config: RouterConfig) -> (LlmRouter, HashMap<Provider, Arc<StubClient>>) {
        let stubs: HashMap<Provider, Arc<StubClient>> = Provider::ALL
            .into_iter()
            .map(|provider| (provider, StubClient::new(provider)))
            .collect();
        let clients: Vec<Arc<dyn GenerationClient>> = stubs
            .values()
            .map(|stub| stub.clone() as Arc<dyn GenerationClient>)
            .collect();
        (LlmRouter::new(config, clients), stubs)
    }

    // ------------------------------------------------------------------
    // Dry run
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_dry_run_returns_mock_without_accounting() {
        let mut config = test_config(&Provider::ALL);
        config.dry_run = true;
        let (router, stubs) = stub_router(config);

        let result = router
            .generate(GenerateRequest::new("hello world"))
            .await
            .unwrap();

        assert_eq!(result.provider, Provider::Anthropic);
        assert_eq!(result.cost_display(), "$0.00");
        assert_eq!(result.retries, 0);
        assert!(result.text.contains("anthropic"));
        assert!(result.text.contains("hello world"));

        // No client was touched and no counter moved.
        for stub in stubs.values() {
            assert_eq!(stub.calls(), 0);
        }
        let mut state = router.state.lock().await;
        assert_eq!(state.budget.used(), 0.0);
        assert!(state.usage_stats.is_empty());
        assert!(state.usage_history.is_empty());
        let now = Utc::now();
        for window in state.request_windows.values_mut() {
            assert_eq!(window.count(now), 0);
        }
    }

    #[tokio::test]
    async fn test_dry_run_search_mock_has_search_marker() {
        let mut config = test_config(&Provider::ALL);
        config.dry_run = true;
        let (router, _) = stub_router(config);

        let result = router
            .generate(
                GenerateRequest::new("hello")
                    .with_max_tokens(10)
                    .with_task_type(TaskType::Search),
            )
            .await
            .unwrap();

        assert_eq!(result.provider, Provider::Perplexity);
        assert!(result.text.contains("search"));
        assert_eq!(result.cost_display(), "$0.00");
    }

    #[tokio::test]
    async fn test_dry_run_mock_truncates_long_prompts() {
        let mut config = test_config(&Provider::ALL);
        config.dry_run = true;
        let (router, _) = stub_router(config);

        let prompt = "x".repeat(200);
        let result = router.generate(GenerateRequest::new(prompt)).await.unwrap();

        assert!(result.text.contains(&"x".repeat(80)));
        assert!(!result.text.contains(&"x".repeat(81)));
    }

    #[tokio::test]
    async fn test_no_provider_available_even_in_dry_run() {
        // No credentials anywhere: selection fails before the mock path.
        let mut config = test_config(&[]);
        config.dry_run = true;
        let (router, _) = stub_router(config);

        let err = router
            .generate(GenerateRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoProviderAvailable));
        assert_eq!(err.to_string(), "no available LLM provider");
    }

    // ------------------------------------------------------------------
    // Selection policy
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_priority_skips_unavailable_head() {
        let (router, _) = stub_router(test_config(&[Provider::Gemini, Provider::Perplexity]));
        let selected = router.select_provider(None, None).await;
        assert_eq!(selected, Some(Provider::Gemini));
    }

    #[tokio::test]
    async fn test_preferred_provider_overrides_priority() {
        let (router, _) = stub_router(test_config(&Provider::ALL));
        let selected = router.select_provider(Some(Provider::Gemini), None).await;
        assert_eq!(selected, Some(Provider::Gemini));
    }

    #[tokio::test]
    async fn test_preferred_openai_rejected_without_opt_in() {
        let (router, _) = stub_router(test_config(&Provider::ALL));

        // Credential present but opt-in absent: never offered.
        assert!(!router
            .available_providers()
            .await
            .contains(&Provider::OpenAi));
        let selected = router.select_provider(Some(Provider::OpenAi), None).await;
        assert_eq!(selected, Some(Provider::Anthropic));
    }

    #[tokio::test]
    async fn test_openai_selectable_when_opted_in() {
        let mut config = test_config(&Provider::ALL);
        config.enable_openai = true;
        config.priority.push(Provider::OpenAi);
        let (router, _) = stub_router(config);

        let selected = router.select_provider(Some(Provider::OpenAi), None).await;
        assert_eq!(selected, Some(Provider::OpenAi));
    }

    #[tokio::test]
    async fn test_search_task_routes_to_perplexity() {
        let (router, _) = stub_router(test_config(&Provider::ALL));
        let selected = router.select_provider(None, Some(TaskType::Search)).await;
        assert_eq!(selected, Some(Provider::Perplexity));
    }

    #[tokio::test]
    async fn test_search_only_provider_excluded_for_non_search() {
        let mut config = test_config(&Provider::ALL);
        config.priority = vec![Provider::Perplexity, Provider::Anthropic];
        let (router, _) = stub_router(config);

        let selected = router.select_provider(None, Some(TaskType::Analyze)).await;
        assert_eq!(selected, Some(Provider::Anthropic));

        // Explicit preference does not bypass the restriction either.
        let selected = router
            .select_provider(Some(Provider::Perplexity), None)
            .await;
        assert_eq!(selected, Some(Provider::Anthropic));
    }

    #[tokio::test]
    async fn test_search_only_restriction_can_be_disabled() {
        let mut config = test_config(&Provider::ALL);
        config.priority = vec![Provider::Perplexity, Provider::Anthropic];
        config.perplexity_search_only = false;
        let (router, _) = stub_router(config);

        let selected = router.select_provider(None, None).await;
        assert_eq!(selected, Some(Provider::Perplexity));
    }

    // ------------------------------------------------------------------
    // Circuit breaker
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_breaker_opens_after_five_failed_generates() {
        let config = test_config(&[Provider::Anthropic, Provider::Gemini]);
        let (router, stubs) = stub_router(config);

        // Five generates, each exhausting all retries on anthropic and
        // falling back to gemini.
        for _ in 0..5 {
            stubs[&Provider::Anthropic].script_failures(3);
            let result = router.generate(GenerateRequest::new("hi")).await.unwrap();
            assert_eq!(result.provider, Provider::Gemini);
            assert_eq!(result.fallback_from, Some(Provider::Anthropic));
        }

        // Sixth selection skips anthropic entirely.
        let selected = router.select_provider(None, None).await;
        assert_eq!(selected, Some(Provider::Gemini));

        let mut state = router.state.lock().await;
        assert!(state
            .breakers
            .get_mut(&Provider::Anthropic)
            .unwrap()
            .is_open(Utc::now()));
    }

    #[tokio::test]
    async fn test_breaker_auto_closes_after_reset_window() {
        let (router, _) = stub_router(test_config(&[Provider::Anthropic]));

        // Open the breaker as of 301 seconds ago.
        let past = Utc::now() - chrono::Duration::seconds(301);
        {
            let mut state = router.state.lock().await;
            let breaker = state.breakers.get_mut(&Provider::Anthropic).unwrap();
            for _ in 0..5 {
                breaker.record_failure(past);
            }
        }

        let selected = router.select_provider(None, None).await;
        assert_eq!(selected, Some(Provider::Anthropic));

        let state = router.state.lock().await;
        assert_eq!(
            state.breakers[&Provider::Anthropic].failure_count(),
            0,
            "auto-close must reset the error count"
        );
    }

    // ------------------------------------------------------------------
    // Rate limit
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_rate_limited_provider_excluded_until_window_passes() {
        let (router, _) =
            stub_router(test_config(&[Provider::Anthropic, Provider::Gemini]));

        let now = Utc::now();
        {
            let mut state = router.state.lock().await;
            let window = state.request_windows.get_mut(&Provider::Anthropic).unwrap();
            for _ in 0..60 {
                window.record(now);
            }
        }
        assert_eq!(router.select_provider(None, None).await, Some(Provider::Gemini));

        // Same count of timestamps, but all older than the 60s window.
        {
            let mut state = router.state.lock().await;
            let window = state.request_windows.get_mut(&Provider::Anthropic).unwrap();
            let stale = now - chrono::Duration::seconds(61);
            *window = RateWindow::default();
            for _ in 0..60 {
                window.record(stale);
            }
        }
        assert_eq!(
            router.select_provider(None, None).await,
            Some(Provider::Anthropic)
        );
    }

    #[tokio::test]
    async fn test_scenario_breaker_open_and_rate_limited() {
        // Priority [anthropic, gemini, perplexity], anthropic breaker open,
        // gemini over rate limit: perplexity wins.
        let mut config = test_config(&Provider::ALL);
        config.perplexity_search_only = false;
        let (router, _) = stub_router(config);

        let now = Utc::now();
        {
            let mut state = router.state.lock().await;
            let breaker = state.breakers.get_mut(&Provider::Anthropic).unwrap();
            for _ in 0..5 {
                breaker.record_failure(now);
            }
            let window = state.request_windows.get_mut(&Provider::Gemini).unwrap();
            for _ in 0..60 {
                window.record(now);
            }
        }

        assert_eq!(
            router.select_provider(None, None).await,
            Some(Provider::Perplexity)
        );
    }

    // ------------------------------------------------------------------
    // Budget gate
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_budget_gate_blocks_before_any_call() {
        let mut config = test_config(&[Provider::Anthropic]);
        config.daily_max_cost_usd = 0.001;
        let (router, stubs) = stub_router(config);

        let err = router
            .generate(GenerateRequest::new("hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BudgetExceeded { .. }));
        assert!(err.to_string().starts_with("daily budget exceeded"));
        assert_eq!(stubs[&Provider::Anthropic].calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_generate_records_spend() {
        let (router, stubs) = stub_router(test_config(&[Provider::Anthropic]));

        let result = router.generate(GenerateRequest::new("hi")).await.unwrap();
        assert_eq!(result.provider, Provider::Anthropic);
        assert_eq!(result.retries, 0);
        assert!(result.estimated_cost > 0.0);
        assert_eq!(stubs[&Provider::Anthropic].calls(), 1);

        let state = router.state.lock().await;
        assert!((state.budget.used() - result.estimated_cost).abs() < 1e-12);
        assert_eq!(state.usage_stats[&Provider::Anthropic], 1);
        assert_eq!(state.usage_history.len(), 1);
        assert!(state.usage_history[0].success);
    }

    // ------------------------------------------------------------------
    // Retry and fallback
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_second_attempt() {
        let (router, stubs) = stub_router(test_config(&[Provider::Anthropic]));
        stubs[&Provider::Anthropic].script_failures(1);

        let result = router.generate(GenerateRequest::new("hi")).await.unwrap();
        assert_eq!(result.provider, Provider::Anthropic);
        assert_eq!(result.retries, 1);
        assert_eq!(result.fallback_from, None);
        assert_eq!(stubs[&Provider::Anthropic].calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_chains_across_providers() {
        let mut config = test_config(&Provider::ALL);
        config.perplexity_search_only = false;
        let (router, stubs) = stub_router(config);

        // Anthropic fails all retries, gemini fails its single fallback
        // attempt, perplexity succeeds.
        stubs[&Provider::Anthropic].script_failures(3);
        stubs[&Provider::Gemini].script_failures(1);

        let result = router.generate(GenerateRequest::new("hi")).await.unwrap();
        assert_eq!(result.provider, Provider::Perplexity);
        assert_eq!(result.fallback_from, Some(Provider::Anthropic));
        assert_eq!(result.retries, 4);
        assert_eq!(stubs[&Provider::Anthropic].calls(), 3);
        assert_eq!(stubs[&Provider::Gemini].calls(), 1);
        assert_eq!(stubs[&Provider::Perplexity].calls(), 1);

        let state = router.state.lock().await;
        assert_eq!(state.usage_stats[&Provider::Perplexity], 1);
        assert_eq!(state.usage_stats.get(&Provider::Anthropic), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_providers_failed() {
        let (router, stubs) = stub_router(test_config(&[Provider::Anthropic]));
        stubs[&Provider::Anthropic].script_failures(3);

        let err = router
            .generate(GenerateRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AllProvidersFailed {
                last: Provider::Anthropic
            }
        ));
        assert_eq!(
            err.to_string(),
            "all providers failed; last failed: anthropic"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure_and_falls_back() {
        let config = test_config(&[Provider::Anthropic, Provider::Gemini]);
        let (router, stubs) = stub_router(config);
        stubs[&Provider::Anthropic].set_hang();

        let result = router.generate(GenerateRequest::new("hi")).await.unwrap();
        assert_eq!(result.provider, Provider::Gemini);
        assert_eq!(result.fallback_from, Some(Provider::Anthropic));
        assert_eq!(stubs[&Provider::Anthropic].calls(), 3);

        let state = router.state.lock().await;
        assert_eq!(state.breakers[&Provider::Anthropic].failure_count(), 1);
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_construction_strips_openai_from_priority() {
        let mut config = test_config(&Provider::ALL);
        config.priority = vec![Provider::OpenAi, Provider::Anthropic];
        let (router, _) = stub_router(config);

        let report = router.usage_report().await;
        assert_eq!(report.priority, vec![Provider::Anthropic]);
    }

    #[tokio::test]
    async fn test_set_priority_strips_openai_and_duplicates() {
        let (router, _) = stub_router(test_config(&Provider::ALL));
        router
            .set_priority(vec![
                Provider::Gemini,
                Provider::OpenAi,
                Provider::Gemini,
                Provider::Anthropic,
            ])
            .await;

        let report = router.usage_report().await;
        assert_eq!(report.priority, vec![Provider::Gemini, Provider::Anthropic]);
    }

    #[tokio::test]
    async fn test_enable_and_disable_provider() {
        let (router, _) = stub_router(test_config(&Provider::ALL));

        router.enable_provider(Provider::OpenAi).await;
        assert!(router
            .available_providers()
            .await
            .contains(&Provider::OpenAi));

        router.disable_provider(Provider::OpenAi).await;
        let report = router.usage_report().await;
        assert!(!report.priority.contains(&Provider::OpenAi));
        assert!(!report.available_providers.contains(&Provider::OpenAi));

        // Non-gated providers only lose priority membership.
        router.disable_provider(Provider::Gemini).await;
        let report = router.usage_report().await;
        assert!(!report.priority.contains(&Provider::Gemini));
    }

    #[tokio::test]
    async fn test_clients_registered_under_reported_provider() {
        // Registration order must not matter: each call lands on the stub
        // that reports the selected provider.
        let gemini = StubClient::new(Provider::Gemini);
        let anthropic = StubClient::new(Provider::Anthropic);
        let clients: Vec<Arc<dyn GenerationClient>> = vec![gemini.clone(), anthropic.clone()];
        let router = LlmRouter::new(test_config(&Provider::ALL), clients);

        let result = router
            .generate(GenerateRequest::new("hi").with_preferred_provider(Provider::Gemini))
            .await
            .unwrap();
        assert_eq!(result.provider, Provider::Gemini);
        assert_eq!(gemini.calls(), 1);
        assert_eq!(anthropic.calls(), 0);
    }

    #[tokio::test]
    async fn test_usage_history_ring_evicts_oldest_first() {
        let (router, _) = stub_router(test_config(&[Provider::Anthropic]));
        let base = Utc::now();

        {
            let mut state = router.state.lock().await;
            for i in 0..(USAGE_HISTORY_CAPACITY + 5) {
                state.push_history(UsageEvent {
                    provider: Provider::Anthropic,
                    timestamp: base + chrono::Duration::seconds(i as i64),
                    success: true,
                });
            }
        }

        let history = router.usage_history().await;
        assert_eq!(history.len(), USAGE_HISTORY_CAPACITY);
        // The 5 oldest entries were evicted; the survivors are the newest,
        // still in insertion order.
        assert_eq!(history[0].timestamp, base + chrono::Duration::seconds(5));
        assert_eq!(
            history[USAGE_HISTORY_CAPACITY - 1].timestamp,
            base + chrono::Duration::seconds((USAGE_HISTORY_CAPACITY + 4) as i64)
        );
    }

    #[tokio::test]
    async fn test_usage_report_shape() {
        let (router, _) = stub_router(test_config(&[Provider::Anthropic]));
        router.generate(GenerateRequest::new("hi")).await.unwrap();

        let report = router.usage_report().await;
        assert_eq!(report.total_requests, 1);
        assert_eq!(report.by_provider[&Provider::Anthropic], 1);
        assert_eq!(report.available_providers, vec![Provider::Anthropic]);
        assert!(!report.dry_run);
        assert!(report.daily_cost_used.starts_with('$'));
        assert!(report.daily_budget_remaining.starts_with('$'));
    }

    // ------------------------------------------------------------------
    // Configuration parsing and shared instance
    // ------------------------------------------------------------------

    #[test]
    fn test_config_defaults_are_cost_safe() {
        let config = RouterConfig::default();
        assert!(config.dry_run);
        assert!(config.perplexity_search_only);
        assert!(!config.enable_openai);
        assert_eq!(
            config.priority,
            vec![Provider::Anthropic, Provider::Gemini, Provider::Perplexity]
        );
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(
            parse_priority("gemini, anthropic"),
            vec![Provider::Gemini, Provider::Anthropic]
        );
        // Unknown names and duplicates are dropped.
        assert_eq!(
            parse_priority("gemini,claude,gemini"),
            vec![Provider::Gemini]
        );
        assert!(parse_priority("").is_empty());
    }

    #[test]
    fn test_retry_delay_clamps_to_last_element() {
        let (router, _) = stub_router(test_config(&[]));
        assert_eq!(router.retry_delay(0), Duration::from_secs(2));
        assert_eq!(router.retry_delay(1), Duration::from_secs(4));
        assert_eq!(router.retry_delay(2), Duration::from_secs(8));
        assert_eq!(router.retry_delay(10), Duration::from_secs(8));
    }

    #[test]
    fn test_shared_router_is_cached_and_resettable() {
        reset_shared_router();
        let first = shared_router();
        let second = shared_router();
        assert!(Arc::ptr_eq(&first, &second));

        reset_shared_router();
        let third = shared_router();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_mock_response_templates() {
        let general = mock_response(Provider::Anthropic, "claude-3-5-sonnet-20241022", "hi", None);
        assert!(general.contains("anthropic"));
        assert!(general.contains("$0.00"));

        let search = mock_response(
            Provider::Perplexity,
            "llama-3.1-sonar-large-128k-online",
            "hi",
            Some(TaskType::Search),
        );
        assert!(search.contains("search"));
        assert_ne!(general, search);
    }
}
