//! Playback engine collaborator
//!
//! The engine decodes and renders; the session only commands it and listens
//! to what it reports. Commands are non-blocking. Reports travel as
//! [`EngineTick`]s (every event raised by one engine callback) through an
//! [`EngineEventSink`] that can be cloned onto any engine thread. The sink
//! feeds the session inbox directly, so reports and commands are handled in
//! the order they were sent.

pub mod mock;

pub use mock::{EngineCall, MockEngine};

use crate::session::Inbound;
use crate::tracks::{TrackGroup, TrackType};
use crate::types::{BufferPolicy, ContentKind};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Source handed to the engine on (re)load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    pub url: String,
    pub kind: ContentKind,
    pub buffer: BufferPolicy,
}

/// Engine playback states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Nothing loaded, or the engine dropped its source
    Idle,
    Buffering,
    Ready,
    Ended,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Buffering => write!(f, "buffering"),
            EngineState::Ready => write!(f, "ready"),
            EngineState::Ended => write!(f, "ended"),
        }
    }
}

/// Failure reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    /// Engine-specific code, e.g. `SOURCE_HTTP_404`
    pub code: String,
    pub message: String,
}

impl EngineError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Events raised by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    StateChanged { state: EngineState },
    Error { error: EngineError },
    IsPlayingChanged { playing: bool },
    FirstFrameRendered,
    TracksChanged { groups: Vec<TrackGroup> },
}

impl EngineEvent {
    pub fn state(state: EngineState) -> Self {
        EngineEvent::StateChanged { state }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        EngineEvent::Error {
            error: EngineError::new(code, message),
        }
    }

    pub fn playing(playing: bool) -> Self {
        EngineEvent::IsPlayingChanged { playing }
    }

    pub fn tracks(groups: Vec<TrackGroup>) -> Self {
        EngineEvent::TracksChanged { groups }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EngineEvent::Error { .. })
    }
}

/// Every event raised by a single engine callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineTick(pub Vec<EngineEvent>);

impl EngineTick {
    /// Error events first, remaining events in their original order
    pub fn into_ordered(self) -> Vec<EngineEvent> {
        let (mut errors, rest): (Vec<_>, Vec<_>) =
            self.0.into_iter().partition(EngineEvent::is_error);
        errors.extend(rest);
        errors
    }
}

/// Sending half of the engine event channel
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl EngineEventSink {
    /// Report a single event
    pub fn emit(&self, event: EngineEvent) {
        self.emit_all(vec![event]);
    }

    /// Report every event of one engine callback
    pub fn emit_all(&self, events: Vec<EngineEvent>) {
        if events.is_empty() {
            return;
        }
        if self.tx.send(Inbound::Engine(EngineTick(events))).is_err() {
            debug!("Engine event dropped, session released");
        }
    }

    /// Session side is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, consumed by the session it is spawned with
#[derive(Debug)]
pub struct EngineEvents {
    tx: mpsc::UnboundedSender<Inbound>,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

impl EngineEvents {
    /// Wait for the next tick reported before a session took over
    pub async fn recv(&mut self) -> Option<EngineTick> {
        while let Some(message) = self.rx.recv().await {
            if let Inbound::Engine(tick) = message {
                return Some(tick);
            }
        }
        None
    }

    pub(crate) fn into_inbox(
        self,
    ) -> (mpsc::UnboundedSender<Inbound>, mpsc::UnboundedReceiver<Inbound>) {
        (self.tx, self.rx)
    }
}

/// Create the engine event channel
pub fn event_channel() -> (EngineEventSink, EngineEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EngineEventSink { tx: tx.clone() }, EngineEvents { tx, rx })
}

/// Playback engine interface
///
/// All commands must return without waiting for the engine to act on them.
/// Positions are raw engine values and may be negative or missing while the
/// engine has no timeline.
pub trait PlaybackEngine: Send + Sync {
    /// Load a new source, replacing the current one
    fn set_source(&self, source: &MediaSource);

    fn prepare(&self);

    fn play(&self);

    fn pause(&self);

    fn stop(&self);

    fn seek_to(&self, position_ms: u64);

    fn position_ms(&self) -> Option<i64>;

    fn duration_ms(&self) -> Option<u64>;

    fn buffered_position_ms(&self) -> Option<i64>;

    /// Force `track` of `group` for its type
    fn set_track_override(&self, track_type: TrackType, group: usize, track: usize);

    /// Drop forced selections of a type
    fn clear_track_overrides(&self, track_type: TrackType);

    fn set_track_type_disabled(&self, track_type: TrackType, disabled: bool);

    /// Release the output surface
    fn detach_surface(&self);

    /// Free engine resources; no command follows
    fn release(&self) {}
}
