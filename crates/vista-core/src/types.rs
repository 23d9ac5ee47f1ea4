//! Core types for Vista

use crate::retry::RetryPolicy;
use crate::tracks::TrackCatalogView;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of content being played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Continuous live channel
    Live,
    /// Finite, seekable video-on-demand
    Movie,
    /// Finite episode of a series
    Series,
}

impl ContentKind {
    /// Finite content has a natural end
    pub fn is_finite(&self) -> bool {
        !matches!(self, ContentKind::Live)
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Live => write!(f, "live"),
            ContentKind::Movie => write!(f, "movie"),
            ContentKind::Series => write!(f, "series"),
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(ContentKind::Live),
            "movie" | "vod" => Ok(ContentKind::Movie),
            "series" | "episode" => Ok(ContentKind::Series),
            other => Err(Error::config(format!("unknown content kind '{}'", other))),
        }
    }
}

/// What should currently be playing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackRequest {
    pub url: String,
    pub kind: ContentKind,
}

impl PlaybackRequest {
    pub fn new(url: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// Severity of a surfaced playback error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Automatic recovery is in progress
    Recoverable,
    /// Retries exhausted, playback halted
    Fatal,
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No request installed
    Idle,
    /// Source handed to the engine, waiting for the first state report
    Preparing,
    /// Engine is filling its buffer
    Buffering,
    /// Frames are advancing
    Playing,
    /// Ready but not advancing
    Paused,
    /// Finite content reached its end
    Ended,
    /// Playback failed
    Error(ErrorSeverity),
}

impl LifecycleState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: LifecycleState) -> bool {
        use LifecycleState::*;
        if *self == target {
            return true;
        }
        matches!(
            (self, target),
            // Any request (re)load
            (_, Preparing) |
            // Engine progress
            (Preparing | Buffering | Playing | Paused | Ended | Error(ErrorSeverity::Recoverable),
             Buffering | Playing | Paused) |
            // Natural completion
            (Preparing | Buffering | Playing | Paused | Error(ErrorSeverity::Recoverable), Ended) |
            // Failures
            (Preparing | Buffering | Playing | Paused | Ended | Error(_), Error(_)) |
            // Teardown after a terminal failure
            (Error(ErrorSeverity::Fatal), Idle)
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LifecycleState::Error(_))
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "idle"),
            LifecycleState::Preparing => write!(f, "preparing"),
            LifecycleState::Buffering => write!(f, "buffering"),
            LifecycleState::Playing => write!(f, "playing"),
            LifecycleState::Paused => write!(f, "paused"),
            LifecycleState::Ended => write!(f, "ended"),
            LifecycleState::Error(ErrorSeverity::Recoverable) => write!(f, "error(recoverable)"),
            LifecycleState::Error(ErrorSeverity::Fatal) => write!(f, "error(fatal)"),
        }
    }
}

/// User-visible description of a playback failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Engine error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Automatic attempt this failure led to (or the ceiling when fatal)
    pub attempt: u32,
    /// Attempt ceiling
    pub max_attempts: u32,
    /// Retries exhausted
    pub fatal: bool,
    /// When the failure was observed
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    /// Failure that will be retried automatically
    pub fn retrying(code: impl Into<String>, attempt: u32, max_attempts: u32) -> Self {
        Self {
            code: code.into(),
            message: format!("Playback failed, retrying ({}/{})", attempt, max_attempts),
            attempt,
            max_attempts,
            fatal: false,
            occurred_at: Utc::now(),
        }
    }

    /// Failure after the retry budget ran out
    pub fn exhausted(code: impl Into<String>, detail: &str, max_attempts: u32) -> Self {
        let message = if detail.is_empty() {
            format!("Playback failed after {} attempts", max_attempts)
        } else {
            format!("Playback failed after {} attempts: {}", max_attempts, detail)
        };
        Self {
            code: code.into(),
            message,
            attempt: max_attempts,
            max_attempts,
            fatal: true,
            occurred_at: Utc::now(),
        }
    }
}

/// Position of the current episode inside a series queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCursor {
    /// Zero-based index of the playing episode
    pub index: usize,
    /// Number of episodes in the queue
    pub count: usize,
}

impl EpisodeCursor {
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.count
    }
}

/// Published, read-only view of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub request: Option<PlaybackRequest>,
    pub lifecycle: LifecycleState,
    pub is_playing: bool,
    pub is_buffering: bool,
    pub error: Option<ErrorInfo>,
    pub position_ms: u64,
    /// `None` until the engine reports a duration
    pub duration_ms: Option<u64>,
    pub buffered_position_ms: u64,
    pub first_frame_rendered: bool,
    pub tracks: TrackCatalogView,
    pub selected_audio_id: Option<String>,
    /// `None` while subtitles are off
    pub selected_subtitle_id: Option<String>,
    pub episode: Option<EpisodeCursor>,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            request: None,
            lifecycle: LifecycleState::Idle,
            is_playing: false,
            is_buffering: false,
            error: None,
            position_ms: 0,
            duration_ms: None,
            buffered_position_ms: 0,
            first_frame_rendered: false,
            tracks: TrackCatalogView::default(),
            selected_audio_id: None,
            selected_subtitle_id: None,
            episode: None,
        }
    }
}

impl PlaybackSnapshot {
    /// True when no request is installed and every transient field is zero
    pub fn is_empty(&self) -> bool {
        *self == PlaybackSnapshot::default()
    }

    /// Fraction of known duration played (0.0 - 1.0)
    pub fn progress(&self) -> Option<f64> {
        match self.duration_ms {
            Some(d) if d > 0 => Some((self.position_ms as f64 / d as f64).min(1.0)),
            _ => None,
        }
    }
}

/// Buffering policy handed to the engine with every source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferPolicy {
    /// Buffer the engine tries to keep at minimum (ms)
    pub min_buffer_ms: u64,
    /// Buffer ceiling (ms)
    pub max_buffer_ms: u64,
    /// Buffer required before first playback starts (ms)
    pub buffer_for_playback_ms: u64,
    /// Buffer required to resume after a stall (ms)
    pub buffer_for_rebuffer_ms: u64,
    /// Distance kept behind the live edge (live only)
    pub live_target_offset_ms: Option<u64>,
}

impl BufferPolicy {
    /// Large pre-roll and live-edge offset for continuous streams
    pub const LIVE: BufferPolicy = BufferPolicy {
        min_buffer_ms: 15_000,
        max_buffer_ms: 60_000,
        buffer_for_playback_ms: 3_000,
        buffer_for_rebuffer_ms: 6_000,
        live_target_offset_ms: Some(8_000),
    };

    /// Quick start for seekable content
    pub const ON_DEMAND: BufferPolicy = BufferPolicy {
        min_buffer_ms: 10_000,
        max_buffer_ms: 50_000,
        buffer_for_playback_ms: 2_500,
        buffer_for_rebuffer_ms: 5_000,
        live_target_offset_ms: None,
    };
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Automatic recovery policy
    pub retry: RetryPolicy,
    /// Progress sampling cadence in milliseconds
    pub sample_interval_ms: u64,
    /// How close to the duration an end report counts as natural completion
    pub end_of_stream_tolerance_ms: u64,
    /// Start the next queued episode when one finishes
    pub auto_advance_episodes: bool,
    /// Buffering for live channels
    pub live: BufferPolicy,
    /// Buffering for movies
    pub movie: BufferPolicy,
    /// Buffering for series episodes
    pub series: BufferPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            sample_interval_ms: 500,
            end_of_stream_tolerance_ms: 1_500,
            auto_advance_episodes: true,
            live: BufferPolicy::LIVE,
            movie: BufferPolicy::ON_DEMAND,
            series: BufferPolicy::ON_DEMAND,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_ms == 0 {
            return Err(Error::config("sample_interval_ms must be greater than zero"));
        }
        if self.retry.delay_ms == 0 {
            return Err(Error::config("retry.delay_ms must be greater than zero"));
        }
        let policies = [
            ("live", &self.live),
            ("movie", &self.movie),
            ("series", &self.series),
        ];
        for (name, policy) in policies {
            if policy.min_buffer_ms > policy.max_buffer_ms {
                return Err(Error::config(format!(
                    "{}.min_buffer_ms exceeds {}.max_buffer_ms",
                    name, name
                )));
            }
        }
        Ok(())
    }

    /// Buffering policy for a content kind
    pub fn buffer_policy(&self, kind: ContentKind) -> BufferPolicy {
        match kind {
            ContentKind::Live => self.live,
            ContentKind::Movie => self.movie,
            ContentKind::Series => self.series,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}
