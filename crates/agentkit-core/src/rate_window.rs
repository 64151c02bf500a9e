//! Sliding-window request counter
//!
//! Keeps a bounded ring of request timestamps and answers "how many calls
//! happened in the last window?". Entries older than the window are pruned
//! before every count, and the buffer evicts oldest-first at capacity so a
//! burst can never grow memory without bound. This is advisory shaping
//! state, not admission control: callers use it to prefer other targets.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Default window length
const DEFAULT_WINDOW_SECS: i64 = 60;

/// Default timestamp capacity
const DEFAULT_CAPACITY: usize = 100;

/// Bounded sliding window over request timestamps
#[derive(Debug, Clone)]
pub struct RateWindow {
    timestamps: VecDeque<DateTime<Utc>>,
    window: Duration,
    capacity: usize,
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_WINDOW_SECS), DEFAULT_CAPACITY)
    }
}

impl RateWindow {
    /// Create a window with a custom length and capacity
    #[must_use]
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(capacity),
            window,
            capacity,
        }
    }

    /// Record a request at `now`
    pub fn record(&mut self, now: DateTime<Utc>) {
        if self.timestamps.len() == self.capacity {
            self.timestamps.pop_front();
        }
        self.timestamps.push_back(now);
    }

    /// Number of requests inside the window ending at `now`.
    ///
    /// Prunes stale entries as a side effect.
    pub fn count(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        while let Some(front) = self.timestamps.front() {
            if *front < cutoff {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        self.timestamps.len()
    }

    /// Whether the window has reached `limit` requests as of `now`
    pub fn is_saturated(&mut self, now: DateTime<Utc>, limit: usize) -> bool {
        self.count(now) >= limit
    }
}
