//! Per-provider quota windows and eligibility rules
//!
//! Pure bookkeeping with no I/O: the rotator owns one [`ProviderUsage`] per
//! provider and feeds it the current instant. Instants come from
//! `tokio::time` so paused-clock tests drive window rollover.

use std::time::Duration;
use tokio::time::Instant;

use crate::types::QuotaLimits;

/// Length of the per-minute request window
pub const MINUTE_WINDOW: Duration = Duration::from_secs(60);

/// Length of the per-day request/token window
pub const DAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Fraction of the daily token budget usable before a provider is skipped
pub const TOKEN_HEADROOM: f64 = 0.95;

/// Characters per token used for usage estimation
pub const CHARS_PER_TOKEN: usize = 4;

/// Rough token estimate for a request/response pair
pub fn estimate_tokens(chars: usize) -> u64 {
    chars.div_ceil(CHARS_PER_TOKEN) as u64
}

/// Mutable consumption counters of one provider
#[derive(Debug, Clone)]
pub struct ProviderUsage {
    pub requests_this_minute: u32,
    pub requests_today: u32,
    pub tokens_today: u64,
    pub minute_started: Instant,
    pub day_started: Instant,
    /// Sticky until the day window rolls over
    pub exhausted: bool,
}

impl ProviderUsage {
    pub fn new(now: Instant) -> Self {
        Self {
            requests_this_minute: 0,
            requests_today: 0,
            tokens_today: 0,
            minute_started: now,
            day_started: now,
            exhausted: false,
        }
    }

    /// Reset any window whose length has elapsed
    pub fn roll_windows(&mut self, now: Instant) {
        if now.saturating_duration_since(self.minute_started) >= MINUTE_WINDOW {
            self.requests_this_minute = 0;
            self.minute_started = now;
        }

        if now.saturating_duration_since(self.day_started) >= DAY_WINDOW {
            self.requests_today = 0;
            self.tokens_today = 0;
            self.exhausted = false;
            self.day_started = now;
        }
    }

    /// Whether one more request fits every limit
    pub fn has_capacity(&self, limits: &QuotaLimits) -> bool {
        let token_capacity = match limits.tpd {
            None => true,
            Some(tpd) => (self.tokens_today as f64) < tpd as f64 * TOKEN_HEADROOM,
        };

        !self.exhausted
            && self.requests_this_minute < limits.rpm
            && self.requests_today < limits.rpd
            && token_capacity
    }

    pub fn record_request(&mut self) {
        self.requests_this_minute += 1;
        self.requests_today += 1;
    }

    pub fn record_tokens(&mut self, tokens: u64) {
        self.tokens_today = self.tokens_today.saturating_add(tokens);
    }

    /// Backend reported a per-minute rate limit: hold off until the minute rolls
    pub fn mark_rate_limited(&mut self, limits: &QuotaLimits) {
        self.requests_this_minute = limits.rpm;
    }

    /// Backend reported an exhausted daily quota: hold off until the day rolls
    pub fn mark_exhausted(&mut self, limits: &QuotaLimits) {
        self.exhausted = true;
        self.tokens_today = limits.tpd.unwrap_or(u64::MAX);
    }
}
