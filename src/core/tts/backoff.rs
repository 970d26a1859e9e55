//! Retry delay computation for upstream speech requests.
//!
//! Two sources feed a delay:
//! - a server-advertised hint (`retry-after` header or a `retryDelay` field in
//!   the error body), honored up to [`MAX_SERVER_HINT_MS`];
//! - exponential backoff `base * 2^attempt` plus jitter, capped at
//!   [`MAX_BACKOFF_MS`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Base delay for exponential backoff (milliseconds).
pub const BASE_DELAY_MS: u64 = 600;

/// Ceiling for computed exponential backoff (milliseconds).
pub const MAX_BACKOFF_MS: u64 = 8_000;

/// Jitter is drawn uniformly from `[0, MAX_JITTER_MS)`.
pub const MAX_JITTER_MS: u64 = 250;

/// A single server hint never blocks longer than this (milliseconds).
pub const MAX_SERVER_HINT_MS: u64 = 15_000;

/// Backoff parameters. [`BackoffPolicy::default`] carries the production
/// constants; tests shrink them to keep wall-clock time low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
    pub max_hint_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_BACKOFF_MS,
            jitter_ms: MAX_JITTER_MS,
            max_hint_ms: MAX_SERVER_HINT_MS,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never waits.
    pub const fn immediate() -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
            max_hint_ms: 0,
        }
    }

    /// Milliseconds to wait before the attempt following `attempt`.
    ///
    /// A positive, finite `server_hint_secs` wins over exponential backoff.
    /// Jitter is drawn fresh on every call.
    pub fn delay_for(&self, attempt: u32, server_hint_secs: Option<f64>) -> u64 {
        if let Some(hint) = server_hint_secs.filter(|h| h.is_finite() && *h > 0.0) {
            let hint_ms = (hint * 1000.0).ceil() as u64;
            return hint_ms.min(self.max_hint_ms);
        }

        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let exponential = self.base_delay_ms.saturating_mul(factor);
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.jitter_ms)
        } else {
            0
        };

        exponential.saturating_add(jitter).min(self.max_delay_ms)
    }

    /// [`delay_for`](Self::delay_for) as a [`Duration`].
    pub fn delay(&self, attempt: u32, server_hint_secs: Option<f64>) -> Duration {
        Duration::from_millis(self.delay_for(attempt, server_hint_secs))
    }
}

/// Parse a `retry-after` header value into seconds.
///
/// Accepts delta-seconds (`"120"`) or an HTTP date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). A zero delay or a date in the past
/// is still a hint and yields `Some(0.0)`.
pub fn parse_retry_after(value: &str) -> Option<f64> {
    parse_retry_after_at(value, Utc::now())
}

pub(crate) fn parse_retry_after_at(value: &str, now: DateTime<Utc>) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs as f64);
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let delta_ms = at.with_timezone(&Utc).signed_duration_since(now).num_milliseconds();
    Some(delta_ms.max(0) as f64 / 1000.0)
}

/// Parse a protobuf JSON duration such as `"17s"` or `"1.500s"` into seconds.
///
/// `"0s"` is kept as a zero hint; negative or non-finite values are rejected.
pub fn parse_duration_secs(value: &str) -> Option<f64> {
    let secs: f64 = value.trim().strip_suffix('s')?.parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}
