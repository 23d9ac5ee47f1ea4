//! Bounded automatic recovery
//!
//! Counts consecutive failures for one stream URL and owns the single
//! outstanding retry timer. The timer itself is a spawned tokio task that
//! only hands a [`RetryTicket`] back to its owner; the owner decides what a
//! retry means.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, info};

/// Retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Automatic attempts per URL
    pub max_attempts: u32,
    /// Fixed delay before each attempt, in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 2000,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Point-in-time view of the retry counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Outcome of recording a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule attempt `attempt` of `max_attempts`
    Retry { attempt: u32, max_attempts: u32 },
    /// Budget spent; nothing will be scheduled
    Exhausted { max_attempts: u32 },
}

/// Handed back when a scheduled retry fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTicket {
    pub generation: u64,
}

/// Retry controller for a single playback session
#[derive(Debug)]
pub struct RetryController {
    policy: RetryPolicy,
    /// Failures recorded since the last reset
    attempt: u32,
    /// URL the counter belongs to
    url: Option<String>,
    /// Latched once the budget is spent
    exhausted: bool,
    /// Bumped on every schedule and cancel
    generation: u64,
    pending: Option<AbortHandle>,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            url: None,
            exhausted: false,
            generation: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> RetryState {
        RetryState {
            attempt: self.attempt,
            max_attempts: self.policy.max_attempts,
            delay: self.policy.delay(),
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// A retry timer is outstanding
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Bind the counter to `url`. Returns true when the counter was reset
    /// because the URL changed.
    pub fn begin_request(&mut self, url: &str) -> bool {
        self.cancel();
        if self.url.as_deref() == Some(url) {
            return false;
        }
        self.url = Some(url.to_string());
        self.attempt = 0;
        self.exhausted = false;
        true
    }

    /// Count one failure and decide whether another attempt is allowed
    pub fn record_failure(&mut self) -> RetryDecision {
        if self.exhausted || self.attempt >= self.policy.max_attempts {
            self.exhausted = true;
            self.cancel();
            return RetryDecision::Exhausted {
                max_attempts: self.policy.max_attempts,
            };
        }
        self.attempt += 1;
        RetryDecision::Retry {
            attempt: self.attempt,
            max_attempts: self.policy.max_attempts,
        }
    }

    /// Start the delay timer, replacing any pending one. `on_fire` runs on
    /// the timer task once the delay elapses.
    pub fn schedule<F>(&mut self, on_fire: F) -> RetryTicket
    where
        F: FnOnce(RetryTicket) + Send + 'static,
    {
        self.cancel();
        let ticket = RetryTicket {
            generation: self.generation,
        };
        let delay = self.policy.delay();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(ticket);
        });
        self.pending = Some(task.abort_handle());
        debug!(
            attempt = self.attempt,
            generation = ticket.generation,
            delay_ms = self.policy.delay_ms,
            "Retry scheduled"
        );
        ticket
    }

    /// Accept a fired ticket. Stale tickets (cancelled or superseded) are
    /// rejected.
    pub fn take_fired(&mut self, ticket: RetryTicket) -> bool {
        if self.pending.is_none() || ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "Stale retry ignored"
            );
            return false;
        }
        self.pending = None;
        self.generation += 1;
        true
    }

    /// Abort the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            debug!(generation = self.generation, "Pending retry cancelled");
        }
        self.generation += 1;
    }

    /// Playback recovered: zero the counter
    pub fn reset(&mut self) {
        if self.attempt > 0 || self.exhausted {
            info!(attempts = self.attempt, "Retry counter reset");
        }
        self.attempt = 0;
        self.exhausted = false;
    }

    /// User asked to try again: an exhausted budget starts over, otherwise
    /// the count is kept
    pub fn rearm(&mut self) {
        self.cancel();
        if self.exhausted {
            self.attempt = 0;
            self.exhausted = false;
        }
    }

    /// Full teardown
    pub fn clear(&mut self) {
        self.cancel();
        self.attempt = 0;
        self.exhausted = false;
        self.url = None;
    }
}

impl Drop for RetryController {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
