//! Vista Core - Playback session management for Vista
//!
//! This crate owns everything between a "play this" request and a media
//! engine:
//! - Lifecycle state machine driven by engine reports
//! - Bounded automatic recovery with a fixed retry delay
//! - Audio and subtitle track catalog with stable ids
//! - Periodic progress sampling
//! - Foreground service coordination
//! - Series episode queues
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Vista Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   PlaybackSession (handle)        watch::Receiver<Snapshot>     │
//! │          │ commands                         ▲                   │
//! │          ▼                                  │ publish           │
//! │   ┌──────────────────────────────────────────────────┐          │
//! │   │                 Session task                      │          │
//! │   │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐ │          │
//! │   │  │  Retry   │ │  Track   │ │ Progress │ │Episode│ │          │
//! │   │  │Controller│ │ Catalog  │ │ Sampler  │ │ Queue │ │          │
//! │   │  └──────────┘ └──────────┘ └──────────┘ └───────┘ │          │
//! │   └──────┬──────────────────▲───────────────┬─────────┘          │
//! │          │ commands         │ EngineTick    │ audible            │
//! │          ▼                  │               ▼                    │
//! │   ┌─────────────────────────┴──┐   ┌──────────────────────┐      │
//! │   │      PlaybackEngine        │   │ ForegroundCoordinator │      │
//! │   └────────────────────────────┘   └──────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod episodes;
pub mod error;
pub mod foreground;
pub mod retry;
pub mod sampler;
pub mod session;
pub mod tracks;
pub mod types;

pub use engine::{
    event_channel, EngineCall, EngineError, EngineEvent, EngineEventSink, EngineEvents, EngineState,
    EngineTick, MediaSource, MockEngine, PlaybackEngine,
};
pub use episodes::EpisodeQueue;
pub use error::{Error, Result};
pub use foreground::{ForegroundCoordinator, NoopForeground, RecordingForeground};
pub use retry::{RetryController, RetryDecision, RetryPolicy, RetryState};
pub use sampler::{ProgressSample, ProgressSampler};
pub use session::PlaybackSession;
pub use tracks::{
    TrackCatalog, TrackCatalogView, TrackFormat, TrackGroup, TrackOption, TrackType,
    SUBTITLES_OFF_ID,
};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialization
pub fn init() {
    tracing::info!(version = VERSION, "Vista Core initialized");
}
