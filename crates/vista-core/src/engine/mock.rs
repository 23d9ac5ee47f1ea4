//! Recording engine for tests and tooling
//!
//! Records every command and serves positions set by the caller. It never
//! raises events on its own; drive it through an
//! [`EngineEventSink`](super::EngineEventSink).

use super::{MediaSource, PlaybackEngine};
use crate::tracks::TrackType;
use std::sync::{Mutex, MutexGuard};

/// A command received by [`MockEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    SetSource(MediaSource),
    Prepare,
    Play,
    Pause,
    Stop,
    SeekTo(u64),
    SetTrackOverride {
        track_type: TrackType,
        group: usize,
        track: usize,
    },
    ClearTrackOverrides(TrackType),
    SetTrackTypeDisabled(TrackType, bool),
    DetachSurface,
    Release,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<EngineCall>,
    position_ms: Option<i64>,
    duration_ms: Option<u64>,
    buffered_position_ms: Option<i64>,
}

/// Engine double that records commands
#[derive(Debug, Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // Poisoning is ignored
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: EngineCall) {
        self.lock().calls.push(call);
    }

    /// Every command received so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    /// Number of commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn prepare_count(&self) -> usize {
        self.count(|c| matches!(c, EngineCall::Prepare))
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn set_position(&self, position_ms: Option<i64>) {
        self.lock().position_ms = position_ms;
    }

    pub fn set_duration(&self, duration_ms: Option<u64>) {
        self.lock().duration_ms = duration_ms;
    }

    pub fn set_buffered_position(&self, buffered_ms: Option<i64>) {
        self.lock().buffered_position_ms = buffered_ms;
    }
}

impl PlaybackEngine for MockEngine {
    fn set_source(&self, source: &MediaSource) {
        self.record(EngineCall::SetSource(source.clone()));
    }

    fn prepare(&self) {
        self.record(EngineCall::Prepare);
    }

    fn play(&self) {
        self.record(EngineCall::Play);
    }

    fn pause(&self) {
        self.record(EngineCall::Pause);
    }

    fn stop(&self) {
        self.record(EngineCall::Stop);
    }

    fn seek_to(&self, position_ms: u64) {
        let mut state = self.lock();
        state.position_ms = Some(position_ms as i64);
        state.calls.push(EngineCall::SeekTo(position_ms));
    }

    fn position_ms(&self) -> Option<i64> {
        self.lock().position_ms
    }

    fn duration_ms(&self) -> Option<u64> {
        self.lock().duration_ms
    }

    fn buffered_position_ms(&self) -> Option<i64> {
        self.lock().buffered_position_ms
    }

    fn set_track_override(&self, track_type: TrackType, group: usize, track: usize) {
        self.record(EngineCall::SetTrackOverride {
            track_type,
            group,
            track,
        });
    }

    fn clear_track_overrides(&self, track_type: TrackType) {
        self.record(EngineCall::ClearTrackOverrides(track_type));
    }

    fn set_track_type_disabled(&self, track_type: TrackType, disabled: bool) {
        self.record(EngineCall::SetTrackTypeDisabled(track_type, disabled));
    }

    fn detach_surface(&self) {
        self.record(EngineCall::DetachSurface);
    }

    fn release(&self) {
        self.record(EngineCall::Release);
    }
}
