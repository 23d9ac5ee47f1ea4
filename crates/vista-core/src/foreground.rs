//! Foreground service coordination
//!
//! The OS-level service (notification, wake locks) lives outside this
//! crate. The session only tells it whether playback is audible.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// External service that keeps playback alive in the background
#[async_trait]
pub trait ForegroundCoordinator: Send + Sync {
    /// `true` starts the service, `false` stops it
    async fn notify_audible(&self, audible: bool);
}

/// Coordinator for hosts without a foreground service
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopForeground;

#[async_trait]
impl ForegroundCoordinator for NoopForeground {
    async fn notify_audible(&self, _audible: bool) {}
}

/// Coordinator that records every notification
#[derive(Debug, Default)]
pub struct RecordingForeground {
    calls: Mutex<Vec<bool>>,
}

impl RecordingForeground {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<bool> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn starts(&self) -> usize {
        self.calls().iter().filter(|audible| **audible).count()
    }

    pub fn stops(&self) -> usize {
        self.calls().iter().filter(|audible| !**audible).count()
    }
}

#[async_trait]
impl ForegroundCoordinator for RecordingForeground {
    async fn notify_audible(&self, audible: bool) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(audible);
        }
    }
}

/// Forwards only changes of the audible flag
pub(crate) struct ForegroundGate {
    coordinator: Arc<dyn ForegroundCoordinator>,
    audible: Option<bool>,
}

impl ForegroundGate {
    pub(crate) fn new(coordinator: Arc<dyn ForegroundCoordinator>) -> Self {
        Self {
            coordinator,
            audible: None,
        }
    }

    pub(crate) async fn set_audible(&mut self, audible: bool) {
        if self.audible == Some(audible) {
            return;
        }
        self.audible = Some(audible);
        debug!(audible, "Foreground coordinator notified");
        self.coordinator.notify_audible(audible).await;
    }

    pub(crate) async fn start(&mut self) {
        self.set_audible(true).await;
    }

    pub(crate) async fn stop(&mut self) {
        self.set_audible(false).await;
    }
}
