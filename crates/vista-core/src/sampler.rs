//! Progress sampling
//!
//! A fixed-cadence timer task posts ticks to the session; the session reads
//! the engine on its own context and folds the result into the snapshot.

use crate::engine::PlaybackEngine;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Consistent position/duration/buffered triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSample {
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub buffered_position_ms: u64,
}

impl ProgressSample {
    /// Read the engine. A missing duration falls back to `last_duration`.
    pub fn read(engine: &dyn PlaybackEngine, last_duration: Option<u64>) -> Self {
        Self::from_raw(
            engine.position_ms(),
            engine.duration_ms(),
            engine.buffered_position_ms(),
            last_duration,
        )
    }

    /// Clamp raw engine values so that
    /// `position <= buffered <= duration` whenever a duration is known
    pub fn from_raw(
        position: Option<i64>,
        duration: Option<u64>,
        buffered: Option<i64>,
        last_duration: Option<u64>,
    ) -> Self {
        let duration_ms = duration.filter(|d| *d > 0).or(last_duration);

        let mut position_ms = position.unwrap_or(0).max(0) as u64;
        if let Some(d) = duration_ms {
            position_ms = position_ms.min(d);
        }

        let upper = duration_ms.unwrap_or(u64::MAX);
        let buffered_position_ms =
            (buffered.unwrap_or(0).max(0) as u64).clamp(position_ms, upper.max(position_ms));

        Self {
            position_ms,
            duration_ms,
            buffered_position_ms,
        }
    }
}

/// Background timer that requests a progress read every interval
#[derive(Debug)]
pub struct ProgressSampler {
    task: JoinHandle<()>,
}

impl ProgressSampler {
    /// Start ticking. `on_tick` returns false once its receiver is gone,
    /// which ends the task.
    pub fn spawn<F>(interval: Duration, on_tick: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !on_tick() {
                    debug!("Progress sampler receiver closed");
                    break;
                }
            }
        });

        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop ticking
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
