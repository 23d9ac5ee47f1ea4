//! Simulated playback engine
//!
//! Stands in for a real decoder: loads take a fixed time, the first
//! `failures` loads fail, the clock advances while playing and finite
//! content reports its end when the clock reaches the duration.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};
use vista_core::{
    EngineEvent, EngineEventSink, EngineState, MediaSource, PlaybackEngine, TrackFormat, TrackGroup,
    TrackType,
};

const LANGUAGES: [&str; 5] = ["en", "es", "fr", "de", "ja"];

/// Behaviour of the simulated stream
#[derive(Debug, Clone)]
pub struct SimProfile {
    /// Loads that fail before one succeeds
    pub failures: u32,
    /// `None` for live streams
    pub duration_ms: Option<u64>,
    pub audio_tracks: usize,
    pub text_tracks: usize,
    /// Time from prepare to ready
    pub load_ms: u64,
    /// How far ahead of the playhead the buffer reaches
    pub buffer_ahead_ms: u64,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            failures: 0,
            duration_ms: None,
            audio_tracks: 1,
            text_tracks: 0,
            load_ms: 400,
            buffer_ahead_ms: 8_000,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    source: Option<MediaSource>,
    failures_left: u32,
    play_when_ready: bool,
    ready: bool,
    first_frame: bool,
    playing_since: Option<Instant>,
    offset_ms: u64,
    audio_override: Option<(usize, usize)>,
    text_override: Option<(usize, usize)>,
    text_disabled: bool,
    load: Option<JoinHandle<()>>,
    end: Option<JoinHandle<()>>,
}

impl SimState {
    fn position_ms(&self) -> u64 {
        let running = self
            .playing_since
            .map(|since| since.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.offset_ms + running
    }

    fn abort_tasks(&mut self) {
        if let Some(task) = self.load.take() {
            task.abort();
        }
        if let Some(task) = self.end.take() {
            task.abort();
        }
    }
}

struct Inner {
    sink: EngineEventSink,
    profile: SimProfile,
    state: Mutex<SimState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn track_groups(&self, state: &SimState) -> Vec<TrackGroup> {
        let audio_selected = state.audio_override.map(|(_, track)| track).unwrap_or(0);
        let audio = (0..self.profile.audio_tracks)
            .map(|i| {
                TrackFormat::new(None, Some(LANGUAGES[i % LANGUAGES.len()]))
                    .with_selected(i == audio_selected)
            })
            .collect();
        let text = (0..self.profile.text_tracks)
            .map(|i| {
                let selected =
                    !state.text_disabled && state.text_override.map(|(_, t)| t) == Some(i);
                TrackFormat::new(None, Some(LANGUAGES[i % LANGUAGES.len()])).with_selected(selected)
            })
            .collect();

        let mut groups = vec![TrackGroup::new(
            TrackType::Video,
            vec![TrackFormat::new(Some("1080p"), None).with_selected(true)],
        )];
        if self.profile.audio_tracks > 0 {
            groups.push(TrackGroup::new(TrackType::Audio, audio));
        }
        if self.profile.text_tracks > 0 {
            groups.push(TrackGroup::new(TrackType::Text, text));
        }
        groups
    }

    async fn load(self: Arc<Self>) {
        self.sink.emit(EngineEvent::state(EngineState::Buffering));
        tokio::time::sleep(Duration::from_millis(self.profile.load_ms)).await;

        let (failed, groups, autoplay) = {
            let mut state = self.lock();
            state.load = None;
            if state.failures_left > 0 {
                state.failures_left -= 1;
                (true, Vec::new(), false)
            } else {
                state.ready = true;
                (false, self.track_groups(&state), state.play_when_ready)
            }
        };

        if failed {
            warn!("Simulated load failure");
            self.sink.emit_all(vec![
                EngineEvent::error("SOURCE_HTTP_503", "upstream returned 503 Service Unavailable"),
                EngineEvent::state(EngineState::Idle),
            ]);
            return;
        }

        self.sink.emit_all(vec![
            EngineEvent::tracks(groups),
            EngineEvent::state(EngineState::Ready),
        ]);
        if autoplay {
            self.start_playing();
        }
    }

    fn start_playing(self: &Arc<Self>) {
        let first_frame = {
            let mut state = self.lock();
            if !state.ready || state.playing_since.is_some() {
                return;
            }
            state.playing_since = Some(Instant::now());
            self.schedule_end(&mut state);
            !std::mem::replace(&mut state.first_frame, true)
        };

        let mut events = vec![EngineEvent::playing(true)];
        if first_frame {
            events.push(EngineEvent::FirstFrameRendered);
        }
        self.sink.emit_all(events);
    }

    fn schedule_end(self: &Arc<Self>, state: &mut SimState) {
        if let Some(task) = state.end.take() {
            task.abort();
        }
        let Some(duration) = self.profile.duration_ms else {
            return;
        };
        if state.playing_since.is_none() {
            return;
        }
        let remaining = duration.saturating_sub(state.offset_ms);
        let inner = Arc::clone(self);
        state.end = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(remaining)).await;
            inner.finish();
        }));
    }

    fn finish(&self) {
        {
            let mut state = self.lock();
            state.end = None;
            state.playing_since = None;
            state.offset_ms = self.profile.duration_ms.unwrap_or(state.offset_ms);
        }
        debug!("Simulated stream reached its end");
        self.sink.emit_all(vec![
            EngineEvent::playing(false),
            EngineEvent::state(EngineState::Ended),
        ]);
    }

    fn emit_tracks(&self) {
        let groups = {
            let state = self.lock();
            if !state.ready {
                return;
            }
            self.track_groups(&state)
        };
        self.sink.emit(EngineEvent::tracks(groups));
    }
}

/// Engine driven by timers instead of a decoder
pub struct SimulatedEngine {
    inner: Arc<Inner>,
}

impl SimulatedEngine {
    pub fn new(sink: EngineEventSink, profile: SimProfile) -> Self {
        let state = SimState {
            failures_left: profile.failures,
            ..Default::default()
        };
        Self {
            inner: Arc::new(Inner {
                sink,
                profile,
                state: Mutex::new(state),
            }),
        }
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn set_source(&self, source: &MediaSource) {
        debug!(url = %source.url, kind = %source.kind, "Simulated source set");
        let mut state = self.inner.lock();
        state.abort_tasks();
        state.source = Some(source.clone());
        state.ready = false;
        state.first_frame = false;
        state.playing_since = None;
        state.offset_ms = 0;
        state.audio_override = None;
        state.text_override = None;
    }

    fn prepare(&self) {
        let mut state = self.inner.lock();
        if state.source.is_none() {
            return;
        }
        if let Some(task) = state.load.take() {
            task.abort();
        }
        state.load = Some(tokio::spawn(Arc::clone(&self.inner).load()));
    }

    fn play(&self) {
        self.inner.lock().play_when_ready = true;
        self.inner.start_playing();
    }

    fn pause(&self) {
        {
            let mut state = self.inner.lock();
            state.play_when_ready = false;
            if state.playing_since.is_none() {
                return;
            }
            state.offset_ms = state.position_ms();
            state.playing_since = None;
            if let Some(task) = state.end.take() {
                task.abort();
            }
        }
        self.inner.sink.emit(EngineEvent::playing(false));
    }

    fn stop(&self) {
        let was_playing = {
            let mut state = self.inner.lock();
            state.abort_tasks();
            state.ready = false;
            state.play_when_ready = false;
            state.offset_ms = 0;
            state.playing_since.take().is_some()
        };
        let mut events = Vec::new();
        if was_playing {
            events.push(EngineEvent::playing(false));
        }
        events.push(EngineEvent::state(EngineState::Idle));
        self.inner.sink.emit_all(events);
    }

    fn seek_to(&self, position_ms: u64) {
        let mut state = self.inner.lock();
        let target = match self.inner.profile.duration_ms {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        };
        state.offset_ms = target;
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
            self.inner.schedule_end(&mut state);
        }
    }

    fn position_ms(&self) -> Option<i64> {
        let state = self.inner.lock();
        state.source.as_ref()?;
        Some(state.position_ms() as i64)
    }

    fn duration_ms(&self) -> Option<u64> {
        let state = self.inner.lock();
        if state.ready {
            self.inner.profile.duration_ms
        } else {
            None
        }
    }

    fn buffered_position_ms(&self) -> Option<i64> {
        let state = self.inner.lock();
        if !state.ready {
            return None;
        }
        Some((state.position_ms() + self.inner.profile.buffer_ahead_ms) as i64)
    }

    fn set_track_override(&self, track_type: TrackType, group: usize, track: usize) {
        {
            let mut state = self.inner.lock();
            match track_type {
                TrackType::Audio => state.audio_override = Some((group, track)),
                TrackType::Text => state.text_override = Some((group, track)),
                TrackType::Video => return,
            }
        }
        self.inner.emit_tracks();
    }

    fn clear_track_overrides(&self, track_type: TrackType) {
        let mut state = self.inner.lock();
        match track_type {
            TrackType::Audio => state.audio_override = None,
            TrackType::Text => state.text_override = None,
            TrackType::Video => {}
        }
    }

    fn set_track_type_disabled(&self, track_type: TrackType, disabled: bool) {
        if track_type != TrackType::Text {
            return;
        }
        self.inner.lock().text_disabled = disabled;
        if disabled {
            self.inner.emit_tracks();
        }
    }

    fn detach_surface(&self) {
        debug!("Simulated surface detached");
    }

    fn release(&self) {
        let mut state = self.inner.lock();
        state.abort_tasks();
        state.source = None;
    }
}
