//! Playback Session - Main orchestrator for playback
//!
//! Coordinates:
//! - The single active request and its engine source
//! - State machine transitions driven by engine reports
//! - Bounded automatic recovery
//! - Audio/subtitle track selection
//! - Progress sampling
//!
//! The session runs as one tokio task with a single inbox. [`PlaybackSession`]
//! is a handle that posts commands to it; engine reports arrive through the
//! [`EngineEventSink`](crate::engine::EngineEventSink) paired with the
//! session at spawn; retry and sampler timers post back to the same inbox.
//! Every mutation happens on the task, and every handled message ends with
//! the snapshot being republished.

use crate::{
    engine::{
        EngineError, EngineEvent, EngineEvents, EngineState, EngineTick, MediaSource,
        PlaybackEngine,
    },
    episodes::EpisodeQueue,
    foreground::{ForegroundCoordinator, ForegroundGate},
    retry::{RetryController, RetryDecision, RetryTicket},
    sampler::{ProgressSample, ProgressSampler},
    tracks::{TrackCatalog, TrackGroup, TrackType, SUBTITLES_OFF_ID},
    types::*,
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

/// Everything the session task reacts to, in arrival order
#[derive(Debug)]
pub(crate) enum Inbound {
    Engine(EngineTick),
    Command(Command),
    Timer(TimerEvent),
}

/// Commands posted by the handle
#[derive(Debug)]
pub(crate) enum Command {
    Play {
        request: PlaybackRequest,
        force_prepare: bool,
    },
    PlaySeries {
        episodes: Vec<String>,
        start_index: usize,
    },
    NextEpisode,
    PreviousEpisode,
    Resume,
    Pause,
    TogglePlayPause,
    Stop,
    Seek(i64),
    SeekBy(i64),
    SelectAudio(String),
    SelectSubtitle(Option<String>),
    RetryLastRequest,
    Flush(oneshot::Sender<()>),
    Release(oneshot::Sender<()>),
}

/// Messages from the session's own timers
#[derive(Debug)]
pub(crate) enum TimerEvent {
    RetryFired(RetryTicket),
    SampleTick,
}

/// Playback session managing a single active request
pub struct PlaybackSession {
    /// Unique session ID
    id: SessionId,
    /// Session task inbox
    inbox: mpsc::UnboundedSender<Inbound>,
    /// Latest published snapshot
    snapshot_rx: watch::Receiver<PlaybackSnapshot>,
    /// Session task, taken by `release`
    task: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    /// Start a session task. Must be called from within a tokio runtime.
    ///
    /// `events` is the receiving half of the channel whose sink was given to
    /// `engine`.
    pub fn spawn(
        engine: Arc<dyn PlaybackEngine>,
        events: EngineEvents,
        foreground: Arc<dyn ForegroundCoordinator>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;

        let id = SessionId::new();
        let (inbox, inbox_rx) = events.into_inbox();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::default());

        let actor = SessionActor {
            retry: RetryController::new(config.retry),
            config,
            engine,
            foreground: ForegroundGate::new(foreground),
            catalog: TrackCatalog::new(),
            episodes: None,
            request: None,
            snapshot: PlaybackSnapshot::default(),
            snapshot_tx,
            inbox: inbox.clone(),
            user_stopped: false,
            play_intent: false,
            engine_state: EngineState::Idle,
            failed_this_tick: false,
        };

        let span = info_span!("playback_session", session_id = %id);
        let task = tokio::spawn(actor.run(inbox_rx).instrument(span));

        info!(session_id = %id, "Playback session started");

        Ok(Self {
            id,
            inbox,
            snapshot_rx,
            task: Some(task),
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot_rx.clone()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.inbox
            .send(Inbound::Command(command))
            .map_err(|_| Error::SessionClosed)
    }

    /// Play `url`, reusing the current preparation when nothing changed
    pub fn play(&self, url: impl Into<String>, kind: ContentKind) -> Result<()> {
        self.play_with(url, kind, false)
    }

    /// Play `url`; `force_prepare` reloads even an unchanged request
    pub fn play_with(
        &self,
        url: impl Into<String>,
        kind: ContentKind,
        force_prepare: bool,
    ) -> Result<()> {
        self.send(Command::Play {
            request: PlaybackRequest::new(url, kind),
            force_prepare,
        })
    }

    /// Queue the episodes of a series and play `start_index`
    pub fn play_series(&self, episodes: Vec<String>, start_index: usize) -> Result<()> {
        self.send(Command::PlaySeries {
            episodes,
            start_index,
        })
    }

    pub fn next_episode(&self) -> Result<()> {
        self.send(Command::NextEpisode)
    }

    pub fn previous_episode(&self) -> Result<()> {
        self.send(Command::PreviousEpisode)
    }

    /// Resume the current request
    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    /// Pause; automatic restarts are suppressed until playback resumes
    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Command::TogglePlayPause)
    }

    /// Tear down the request, retry state, tracks and snapshot
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Seek to an absolute position
    pub fn seek(&self, position_ms: i64) -> Result<()> {
        self.send(Command::Seek(position_ms))
    }

    /// Seek relative to the current position
    pub fn seek_by(&self, delta_ms: i64) -> Result<()> {
        self.send(Command::SeekBy(delta_ms))
    }

    pub fn select_audio_track(&self, id: impl Into<String>) -> Result<()> {
        self.send(Command::SelectAudio(id.into()))
    }

    /// Select a subtitle track; `None` switches subtitles off
    pub fn select_subtitle_track(&self, id: Option<&str>) -> Result<()> {
        self.send(Command::SelectSubtitle(id.map(str::to_string)))
    }

    /// Reload the current request without spending an automatic attempt
    pub fn retry_last_request(&self) -> Result<()> {
        self.send(Command::RetryLastRequest)
    }

    /// Wait until every command sent before this call has been applied
    pub async fn flush(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.send(Command::Flush(done))?;
        wait.await.map_err(|_| Error::SessionClosed)
    }

    /// Stop the session task and release the engine
    pub async fn release(mut self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        if self.send(Command::Release(done)).is_ok() {
            let _ = wait.await;
        }
        if let Some(task) = self.task.take() {
            task.await?;
        }
        info!(session_id = %self.id, "Playback session released");
        Ok(())
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if self.task.is_some() {
            let (done, _) = oneshot::channel();
            let _ = self.send(Command::Release(done));
        }
    }
}

/// State owned by the session task
struct SessionActor {
    config: SessionConfig,
    engine: Arc<dyn PlaybackEngine>,
    foreground: ForegroundGate,
    retry: RetryController,
    catalog: TrackCatalog,
    episodes: Option<EpisodeQueue>,
    /// What should currently be playing
    request: Option<PlaybackRequest>,
    /// Working copy, published after every message
    snapshot: PlaybackSnapshot,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
    /// Own inbox, for timers
    inbox: mpsc::UnboundedSender<Inbound>,
    /// Pause/stop came from the user; engine stops are not failures
    user_stopped: bool,
    /// Playback should advance once ready
    play_intent: bool,
    /// Last state reported by the engine
    engine_state: EngineState,
    /// The tick being handled carried a failure
    failed_this_tick: bool,
}

impl SessionActor {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Inbound>) {
        let tick_tx = self.inbox.clone();
        let sampler = ProgressSampler::spawn(self.config.sample_interval(), move || {
            tick_tx.send(Inbound::Timer(TimerEvent::SampleTick)).is_ok()
        });

        while let Some(message) = inbox.recv().await {
            match message {
                Inbound::Engine(tick) => self.handle_tick(tick).await,
                Inbound::Timer(timer) => self.handle_timer(timer),
                Inbound::Command(Command::Release(done)) => {
                    self.shutdown().await;
                    let _ = done.send(());
                    break;
                }
                Inbound::Command(command) => self.handle_command(command).await,
            }
            self.publish();
        }

        sampler.cancel();
    }

    fn publish(&self) {
        self.snapshot_tx.send_if_modified(|current| {
            if *current == self.snapshot {
                false
            } else {
                *current = self.snapshot.clone();
                true
            }
        });
    }

    /// Transition to new lifecycle state
    fn transition(&mut self, target: LifecycleState) -> bool {
        let current = self.snapshot.lifecycle;
        if current == target {
            return true;
        }
        if !current.can_transition_to(target) {
            debug!(from = %current, to = %target, "Ignoring invalid state transition");
            return false;
        }
        self.snapshot.lifecycle = target;
        info!(from = %current, to = %target, "State transition");
        true
    }

    // =========================================================================
    // Commands
    // =========================================================================

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play {
                request,
                force_prepare,
            } => self.play(request, force_prepare),
            Command::PlaySeries {
                episodes,
                start_index,
            } => self.play_series(episodes, start_index),
            Command::NextEpisode => self.step_episode(true),
            Command::PreviousEpisode => self.step_episode(false),
            Command::Resume => self.resume(),
            Command::Pause => self.pause(),
            Command::TogglePlayPause => {
                if self.play_intent {
                    self.pause()
                } else {
                    self.resume()
                }
            }
            Command::Stop => self.stop().await,
            Command::Seek(position_ms) => self.seek(position_ms),
            Command::SeekBy(delta_ms) => {
                let target = (self.snapshot.position_ms as i64).saturating_add(delta_ms);
                self.seek(target)
            }
            Command::SelectAudio(id) => self.select_audio(&id),
            Command::SelectSubtitle(id) => self.select_subtitle(id.as_deref()),
            Command::RetryLastRequest => self.retry_last_request(),
            Command::Flush(done) => {
                self.publish();
                let _ = done.send(());
            }
            // Handled by the run loop
            Command::Release(done) => {
                let _ = done.send(());
            }
        }
    }

    #[instrument(skip(self))]
    fn play(&mut self, request: PlaybackRequest, force_prepare: bool) {
        let url = request.url.trim();
        if url.is_empty() {
            debug!("Ignoring play with blank url");
            return;
        }
        let request = PlaybackRequest::new(url, request.kind);

        if let Some(queue) = &self.episodes {
            if request.kind != ContentKind::Series || !queue.is_current(&request.url) {
                self.episodes = None;
            }
        }

        if !force_prepare && self.request.as_ref() == Some(&request) {
            debug!("Request unchanged, resuming");
            self.resume();
        } else {
            self.load(request);
        }
        self.snapshot.episode = self.episodes.as_ref().map(EpisodeQueue::cursor);
    }

    /// Install `request`, command the engine and zero the transient fields
    fn load(&mut self, request: PlaybackRequest) {
        let counter_reset = self.retry.begin_request(&request.url);
        info!(
            url = %request.url,
            kind = %request.kind,
            counter_reset,
            attempt = self.retry.attempt(),
            "Loading content"
        );

        self.command_source(&request, true);
        self.catalog.clear();
        self.request = Some(request.clone());
        self.user_stopped = false;
        self.play_intent = true;

        self.snapshot = PlaybackSnapshot {
            request: Some(request),
            lifecycle: LifecycleState::Preparing,
            is_buffering: true,
            tracks: self.catalog.view().clone(),
            episode: self.episodes.as_ref().map(EpisodeQueue::cursor),
            ..PlaybackSnapshot::default()
        };
    }

    fn command_source(&self, request: &PlaybackRequest, autoplay: bool) {
        let source = MediaSource {
            url: request.url.clone(),
            kind: request.kind,
            buffer: self.config.buffer_policy(request.kind),
        };
        self.engine.set_source(&source);
        self.engine.prepare();
        if autoplay {
            self.engine.play();
        }
    }

    fn play_series(&mut self, episodes: Vec<String>, start_index: usize) {
        let Some(queue) = EpisodeQueue::new(episodes, start_index) else {
            debug!(start_index, "Ignoring empty or out-of-range episode list");
            return;
        };
        let url = queue.current().to_string();
        self.episodes = Some(queue);
        self.play(PlaybackRequest::new(url, ContentKind::Series), false);
    }

    fn step_episode(&mut self, forward: bool) {
        let next = self.episodes.as_mut().and_then(|queue| {
            let url = if forward { queue.advance() } else { queue.retreat() };
            url.map(str::to_string)
        });
        match next {
            Some(url) => {
                info!(url = %url, forward, "Switching episode");
                self.play(PlaybackRequest::new(url, ContentKind::Series), false);
            }
            None => debug!(forward, "No episode in that direction"),
        }
    }

    fn resume(&mut self) {
        if self.request.is_none() {
            debug!("Ignoring resume without a request");
            return;
        }
        match self.snapshot.lifecycle {
            LifecycleState::Error(ErrorSeverity::Fatal) => {
                self.retry_last_request();
                return;
            }
            LifecycleState::Ended => {
                self.engine.seek_to(0);
                self.snapshot.position_ms = 0;
            }
            _ => {}
        }
        self.user_stopped = false;
        self.play_intent = true;
        self.engine.play();
    }

    fn pause(&mut self) {
        if self.request.is_none() {
            debug!("Ignoring pause without a request");
            return;
        }
        self.user_stopped = true;
        self.play_intent = false;
        self.engine.pause();
    }

    #[instrument(skip(self))]
    async fn stop(&mut self) {
        info!("Stopping playback");

        self.retry.clear();
        self.engine.stop();
        self.engine.detach_surface();
        self.catalog.clear();
        self.episodes = None;
        self.request = None;
        self.user_stopped = true;
        self.play_intent = false;
        self.snapshot = PlaybackSnapshot::default();

        self.foreground.stop().await;
    }

    fn seek(&mut self, position_ms: i64) {
        if self.request.is_none() {
            debug!("Ignoring seek without a request");
            return;
        }
        let mut target = position_ms.max(0) as u64;
        if let Some(duration) = self.snapshot.duration_ms {
            target = target.min(duration);
        }

        info!(from = self.snapshot.position_ms, to = target, "Seeking");

        self.engine.seek_to(target);
        self.snapshot.position_ms = target;
        self.snapshot.buffered_position_ms = self.snapshot.buffered_position_ms.max(target);
    }

    fn select_audio(&mut self, id: &str) {
        let Some(slot) = self.catalog.resolve(TrackType::Audio, id) else {
            debug!(id, version = self.catalog.version(), "Ignoring unknown audio track");
            return;
        };
        info!(id, group = slot.group, track = slot.index, "Selecting audio track");

        self.engine.clear_track_overrides(TrackType::Audio);
        self.engine.set_track_override(TrackType::Audio, slot.group, slot.index);
        self.catalog.mark_selected(slot);
        self.sync_tracks();
    }

    fn select_subtitle(&mut self, id: Option<&str>) {
        if self.request.is_none() {
            debug!("Ignoring subtitle selection without a request");
            return;
        }
        match id {
            Some(SUBTITLES_OFF_ID) if self.catalog.view().text.is_empty() => {
                debug!("Ignoring subtitles-off without subtitle tracks");
            }
            None | Some(SUBTITLES_OFF_ID) => {
                info!("Disabling subtitles");
                self.engine.clear_track_overrides(TrackType::Text);
                self.engine.set_track_type_disabled(TrackType::Text, true);
                self.catalog.mark_text_disabled();
                self.sync_tracks();
            }
            Some(id) => {
                let Some(slot) = self.catalog.resolve(TrackType::Text, id) else {
                    debug!(id, version = self.catalog.version(), "Ignoring unknown subtitle track");
                    return;
                };
                info!(id, group = slot.group, track = slot.index, "Selecting subtitle track");

                self.engine.set_track_type_disabled(TrackType::Text, false);
                self.engine.clear_track_overrides(TrackType::Text);
                self.engine.set_track_override(TrackType::Text, slot.group, slot.index);
                self.catalog.mark_selected(slot);
                self.sync_tracks();
            }
        }
    }

    fn retry_last_request(&mut self) {
        let Some(request) = self.request.clone() else {
            debug!("Ignoring retry without a request");
            return;
        };
        info!(url = %request.url, "Retrying last request");
        self.retry.rearm();
        self.load(request);
    }

    fn sync_tracks(&mut self) {
        let view = self.catalog.view();
        self.snapshot.selected_audio_id = view.selected_audio_id();
        self.snapshot.selected_subtitle_id = view.selected_subtitle_id();
        self.snapshot.tracks = view.clone();
    }

    async fn shutdown(&mut self) {
        info!("Shutting down playback session");
        self.retry.clear();
        self.engine.stop();
        self.engine.detach_surface();
        self.engine.release();
        self.request = None;
        self.catalog.clear();
        self.episodes = None;
        self.snapshot = PlaybackSnapshot::default();
        self.foreground.stop().await;
        self.publish();
    }

    // =========================================================================
    // Engine events
    // =========================================================================

    async fn handle_tick(&mut self, tick: EngineTick) {
        self.failed_this_tick = false;
        for event in tick.into_ordered() {
            self.handle_event(event).await;
        }
        self.failed_this_tick = false;
    }

    async fn handle_event(&mut self, event: EngineEvent) {
        if let EngineEvent::StateChanged { state } = &event {
            self.engine_state = *state;
        }
        if self.request.is_none() {
            debug!(?event, "Ignoring engine event without a request");
            return;
        }

        match event {
            EngineEvent::StateChanged { state } => self.on_state_changed(state).await,
            EngineEvent::Error { error } => {
                warn!(code = %error.code, message = %error.message, "Engine error");
                self.on_failure(error).await;
            }
            EngineEvent::IsPlayingChanged { playing } => self.on_playing_changed(playing).await,
            EngineEvent::FirstFrameRendered => self.on_first_frame(),
            EngineEvent::TracksChanged { groups } => self.on_tracks_changed(&groups),
        }
    }

    async fn on_state_changed(&mut self, state: EngineState) {
        debug!(state = %state, "Engine state changed");
        match state {
            EngineState::Ready => {
                if !self.recover() {
                    return;
                }
                self.snapshot.is_buffering = false;
                self.user_stopped = false;
                let target = if self.play_intent {
                    LifecycleState::Playing
                } else {
                    LifecycleState::Paused
                };
                self.transition(target);
            }
            EngineState::Buffering => {
                self.snapshot.is_buffering = true;
                if !self.snapshot.lifecycle.is_error() {
                    self.transition(LifecycleState::Buffering);
                }
            }
            EngineState::Idle | EngineState::Ended => self.on_stopped(state).await,
        }
    }

    async fn on_stopped(&mut self, state: EngineState) {
        let Some(request) = self.request.clone() else {
            return;
        };

        if state == EngineState::Ended && self.is_natural_end(&request) {
            self.on_completed(&request).await;
            return;
        }
        if self.user_stopped {
            debug!(state = %state, "Engine stopped after user pause");
            if state == EngineState::Ended {
                self.snapshot.is_playing = false;
                self.snapshot.is_buffering = false;
                self.transition(LifecycleState::Ended);
            }
            return;
        }
        if self.retry.is_pending() {
            debug!(state = %state, "Retry already pending");
            return;
        }

        warn!(state = %state, url = %request.url, "Playback stopped unexpectedly");
        self.on_failure(EngineError::new(
            "UNEXPECTED_STOP",
            format!("engine went {} during playback", state),
        ))
        .await;
    }

    /// Finite content that stopped within tolerance of its duration
    fn is_natural_end(&self, request: &PlaybackRequest) -> bool {
        if !request.kind.is_finite() {
            return false;
        }
        let sample = ProgressSample::read(self.engine.as_ref(), self.snapshot.duration_ms);
        match sample.duration_ms {
            Some(duration) => {
                let tolerance = self.config.end_of_stream_tolerance_ms;
                sample.position_ms.saturating_add(tolerance) >= duration
            }
            None => false,
        }
    }

    async fn on_completed(&mut self, request: &PlaybackRequest) {
        info!(url = %request.url, "Playback completed");
        self.retry.cancel();
        if let Some(duration) = self.snapshot.duration_ms {
            self.snapshot.position_ms = duration;
            self.snapshot.buffered_position_ms = duration;
        }
        self.snapshot.is_playing = false;
        self.snapshot.is_buffering = false;
        self.transition(LifecycleState::Ended);

        let has_next = self.episodes.as_ref().map(|q| q.cursor().has_next()).unwrap_or(false);
        if request.kind == ContentKind::Series && self.config.auto_advance_episodes && has_next {
            self.step_episode(true);
        } else {
            self.foreground.stop().await;
        }
    }

    async fn on_failure(&mut self, error: EngineError) {
        self.failed_this_tick = true;
        match self.retry.record_failure() {
            RetryDecision::Retry {
                attempt,
                max_attempts,
            } => {
                warn!(code = %error.code, attempt, max_attempts, "Scheduling retry");
                self.transition(LifecycleState::Error(ErrorSeverity::Recoverable));
                self.snapshot.is_buffering = true;
                self.snapshot.error = Some(ErrorInfo::retrying(error.code, attempt, max_attempts));

                let tx = self.inbox.clone();
                self.retry.schedule(move |ticket| {
                    let _ = tx.send(Inbound::Timer(TimerEvent::RetryFired(ticket)));
                });
            }
            RetryDecision::Exhausted { max_attempts } => {
                warn!(code = %error.code, max_attempts, "Retries exhausted");
                self.transition(LifecycleState::Error(ErrorSeverity::Fatal));
                self.snapshot.is_playing = false;
                self.snapshot.is_buffering = false;
                self.snapshot.error =
                    Some(ErrorInfo::exhausted(error.code, &error.message, max_attempts));
                self.foreground.stop().await;
            }
        }
    }

    async fn on_playing_changed(&mut self, playing: bool) {
        if playing && !self.recover() {
            debug!("Ignoring playback start while failing");
            return;
        }
        self.snapshot.is_playing = playing;
        if playing {
            self.snapshot.is_buffering = false;
            self.transition(LifecycleState::Playing);
            self.foreground.start().await;
        } else {
            if self.snapshot.lifecycle == LifecycleState::Playing {
                let target = if self.snapshot.is_buffering {
                    LifecycleState::Buffering
                } else {
                    LifecycleState::Paused
                };
                self.transition(target);
            }
            self.foreground.stop().await;
        }
    }

    fn on_first_frame(&mut self) {
        debug!("First frame rendered");
        self.snapshot.first_frame_rendered = true;
        let recovering =
            self.snapshot.lifecycle == LifecycleState::Error(ErrorSeverity::Recoverable);
        if !self.recover() {
            return;
        }
        self.snapshot.is_buffering = false;
        if recovering {
            let target = if self.play_intent {
                LifecycleState::Playing
            } else {
                LifecycleState::Paused
            };
            self.transition(target);
        }
    }

    /// Apply a recovery signal (ready, first frame, playback started).
    ///
    /// The retry counter restarts unless the failure was fatal. A signal
    /// arriving in a later tick than the failure also cancels the pending
    /// retry and clears the error; one sharing the failure's tick leaves the
    /// scheduled retry in place. Returns whether the session recovered.
    fn recover(&mut self) -> bool {
        if self.snapshot.lifecycle == LifecycleState::Error(ErrorSeverity::Fatal) {
            return false;
        }
        self.retry.reset();
        if self.failed_this_tick {
            return false;
        }
        if self.retry.is_pending() {
            info!("Recovered before scheduled retry");
            self.retry.cancel();
        }
        self.snapshot.error = None;
        true
    }

    fn on_tracks_changed(&mut self, groups: &[TrackGroup]) {
        self.catalog.rebuild(groups);
        self.sync_tracks();
    }

    // =========================================================================
    // Timers
    // =========================================================================

    fn handle_timer(&mut self, timer: TimerEvent) {
        match timer {
            TimerEvent::RetryFired(ticket) => self.on_retry_fired(ticket),
            TimerEvent::SampleTick => self.on_sample_tick(),
        }
    }

    fn on_retry_fired(&mut self, ticket: RetryTicket) {
        if !self.retry.take_fired(ticket) {
            return;
        }
        let Some(request) = self.request.clone() else {
            return;
        };
        let state = self.retry.state();
        info!(
            url = %request.url,
            attempt = state.attempt,
            max_attempts = state.max_attempts,
            delay_ms = state.delay.as_millis() as u64,
            "Retrying playback"
        );
        self.command_source(&request, self.play_intent);
        self.snapshot.is_buffering = true;
        self.snapshot.first_frame_rendered = false;
    }

    fn on_sample_tick(&mut self) {
        if self.request.is_none() || self.engine_state == EngineState::Idle {
            return;
        }
        let sample = ProgressSample::read(self.engine.as_ref(), self.snapshot.duration_ms);
        self.snapshot.position_ms = sample.position_ms;
        self.snapshot.duration_ms = sample.duration_ms;
        self.snapshot.buffered_position_ms = sample.buffered_position_ms;
    }
}
