//! Integration tests for Vista Core

use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use vista_core::{
    event_channel, ContentKind, EngineCall, EngineEvent, EngineEventSink, EngineState,
    ErrorSeverity, LifecycleState, MockEngine, PlaybackSession, RecordingForeground,
    SessionConfig, TrackFormat, TrackGroup, TrackType, SUBTITLES_OFF_ID,
};

const LIVE_URL: &str = "http://streams.example/live/channel-7.m3u8";
const MOVIE_URL: &str = "http://vod.example/movies/arrival.mp4";

struct Harness {
    session: PlaybackSession,
    engine: Arc<MockEngine>,
    sink: EngineEventSink,
    foreground: Arc<RecordingForeground>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    fn with_config(config: SessionConfig) -> Self {
        let engine = Arc::new(MockEngine::new());
        let (sink, events) = event_channel();
        let foreground = Arc::new(RecordingForeground::new());
        let session =
            PlaybackSession::spawn(engine.clone(), events, foreground.clone(), config).unwrap();
        Self {
            session,
            engine,
            sink,
            foreground,
        }
    }

    async fn flush(&self) {
        self.session.flush().await.unwrap();
    }

    async fn start_playing(&self, url: &str, kind: ContentKind) {
        self.session.play(url, kind).unwrap();
        self.sink.emit(EngineEvent::state(EngineState::Buffering));
        self.sink.emit_all(vec![
            EngineEvent::state(EngineState::Ready),
            EngineEvent::playing(true),
            EngineEvent::FirstFrameRendered,
        ]);
        self.flush().await;
    }

    fn fail(&self) {
        self.sink.emit(EngineEvent::error("SOURCE_IO", "connection reset"));
    }
}

async fn wait_for_retry() {
    tokio::time::sleep(Duration::from_millis(2_001)).await;
}

fn tracks(audio: usize, text: usize) -> Vec<TrackGroup> {
    let audio_tracks = (0..audio)
        .map(|i| TrackFormat::new(None, Some(["en", "es", "fr"][i % 3])).with_selected(i == 0))
        .collect();
    let text_tracks = (0..text).map(|_| TrackFormat::new(Some("English CC"), Some("en"))).collect();
    vec![
        TrackGroup::new(
            TrackType::Video,
            vec![TrackFormat::new(Some("1080p"), None).with_selected(true)],
        ),
        TrackGroup::new(TrackType::Audio, audio_tracks),
        TrackGroup::new(TrackType::Text, text_tracks),
    ]
}

// =============================================================================
// Request Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_same_request_prepares_once() {
    let h = Harness::new();

    assert_ok!(h.session.play(LIVE_URL, ContentKind::Live));
    assert_ok!(h.session.play(LIVE_URL, ContentKind::Live));
    h.flush().await;
    assert_eq!(h.engine.prepare_count(), 1);

    assert_ok!(h.session.play_with(LIVE_URL, ContentKind::Live, true));
    h.flush().await;
    assert_eq!(h.engine.prepare_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_new_request_resets_transient_fields() {
    let h = Harness::new();
    h.engine.set_duration(Some(120_000));
    h.start_playing(MOVIE_URL, ContentKind::Movie).await;
    h.sink.emit(EngineEvent::tracks(tracks(2, 1)));
    h.session.seek(30_000).unwrap();
    h.flush().await;
    assert!(h.session.snapshot().first_frame_rendered);

    h.session.play(LIVE_URL, ContentKind::Live).unwrap();
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Preparing);
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.duration_ms, None);
    assert!(!snapshot.first_frame_rendered);
    assert!(snapshot.tracks.is_empty());
    assert_eq!(snapshot.selected_audio_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_changes() {
    let h = Harness::new();
    let mut rx = h.session.subscribe();

    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().lifecycle, LifecycleState::Preparing);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_live_errors_exhaust_into_fatal() {
    let h = Harness::new();
    h.start_playing(LIVE_URL, ContentKind::Live).await;
    assert_eq!(h.foreground.calls(), vec![true]);

    for attempt in 1..=3u32 {
        h.sink.emit_all(vec![
            EngineEvent::playing(false),
            EngineEvent::error("SOURCE_IO", "connection reset"),
        ]);
        h.flush().await;

        let snapshot = h.session.snapshot();
        assert_eq!(snapshot.lifecycle, LifecycleState::Error(ErrorSeverity::Recoverable));
        assert!(snapshot.is_buffering);
        let error = snapshot.error.unwrap();
        assert_eq!(error.attempt, attempt);
        assert_eq!(error.message, format!("Playback failed, retrying ({}/3)", attempt));

        wait_for_retry().await;
        h.flush().await;
        assert_eq!(h.engine.prepare_count(), 1 + attempt as usize);
    }

    h.fail();
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Error(ErrorSeverity::Fatal));
    assert!(!snapshot.is_playing);
    assert!(!snapshot.is_buffering);
    let error = snapshot.error.unwrap();
    assert!(error.fatal);
    assert_eq!(error.message, "Playback failed after 3 attempts: connection reset");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.engine.prepare_count(), 4);
    assert_eq!(h.foreground.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_frame_resets_attempts() {
    let h = Harness::new();
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();

    h.fail();
    h.flush().await;
    wait_for_retry().await;
    h.fail();
    h.flush().await;
    assert_eq!(h.session.snapshot().error.map(|e| e.attempt), Some(2));
    wait_for_retry().await;

    h.sink.emit(EngineEvent::FirstFrameRendered);
    h.flush().await;
    let snapshot = h.session.snapshot();
    assert!(snapshot.error.is_none());
    assert!(snapshot.first_frame_rendered);
    assert_eq!(snapshot.lifecycle, LifecycleState::Playing);

    h.fail();
    h.flush().await;
    assert_eq!(h.session.snapshot().error.map(|e| e.attempt), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_buffering_keeps_recoverable_error() {
    let h = Harness::new();
    h.start_playing(LIVE_URL, ContentKind::Live).await;

    h.fail();
    h.flush().await;
    wait_for_retry().await;
    h.sink.emit(EngineEvent::state(EngineState::Buffering));
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Error(ErrorSeverity::Recoverable));
    assert!(snapshot.is_buffering);

    h.sink.emit(EngineEvent::state(EngineState::Ready));
    h.flush().await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Playing);
    assert!(snapshot.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_ready_resets_attempts() {
    let h = Harness::new();
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();

    h.fail();
    h.flush().await;
    wait_for_retry().await;
    h.fail();
    h.flush().await;
    assert_eq!(h.session.snapshot().error.map(|e| e.attempt), Some(2));
    wait_for_retry().await;

    h.sink.emit(EngineEvent::state(EngineState::Ready));
    h.flush().await;
    assert!(h.session.snapshot().error.is_none());

    h.fail();
    h.flush().await;
    let error = h.session.snapshot().error.unwrap();
    assert_eq!(error.attempt, 1);
    assert_eq!(error.message, "Playback failed, retrying (1/3)");
}

#[tokio::test(start_paused = true)]
async fn test_ready_before_retry_fires_cancels_it() {
    let h = Harness::new();
    h.start_playing(LIVE_URL, ContentKind::Live).await;

    h.fail();
    h.flush().await;
    h.sink.emit_all(vec![EngineEvent::state(EngineState::Ready), EngineEvent::playing(true)]);
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Playing);
    assert!(snapshot.error.is_none());

    wait_for_retry().await;
    h.flush().await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Playing);
    assert!(!snapshot.is_buffering);
    assert!(snapshot.first_frame_rendered);
    assert_eq!(h.engine.prepare_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_playback_start_clears_recoverable_error() {
    let h = Harness::new();
    h.start_playing(LIVE_URL, ContentKind::Live).await;

    h.sink.emit_all(vec![EngineEvent::playing(false), EngineEvent::error("SOURCE_IO", "stall")]);
    h.flush().await;
    h.sink.emit(EngineEvent::playing(true));
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Playing);
    assert!(snapshot.is_playing);
    assert!(snapshot.error.is_none());

    wait_for_retry().await;
    h.flush().await;
    assert_eq!(h.engine.prepare_count(), 1);

    h.fail();
    h.flush().await;
    assert_eq!(h.session.snapshot().error.map(|e| e.attempt), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_recovery_in_failing_tick_keeps_retry() {
    let h = Harness::new();
    h.start_playing(LIVE_URL, ContentKind::Live).await;

    h.sink.emit_all(vec![
        EngineEvent::playing(true),
        EngineEvent::FirstFrameRendered,
        EngineEvent::error("SOURCE_IO", "connection reset"),
    ]);
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Error(ErrorSeverity::Recoverable));
    assert!(snapshot.is_buffering);
    assert_eq!(snapshot.error.map(|e| e.attempt), Some(1));

    wait_for_retry().await;
    h.flush().await;
    assert_eq!(h.engine.prepare_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_last_request_rearms_after_fatal() {
    let config =
        SessionConfig::from_json(r#"{"retry": {"max_attempts": 1, "delay_ms": 100}}"#).unwrap();
    let h = Harness::with_config(config);
    h.session.play(LIVE_URL, ContentKind::Live).unwrap();

    h.fail();
    h.flush().await;
    tokio::time::sleep(Duration::from_millis(101)).await;
    h.fail();
    h.flush().await;
    assert_eq!(h.session.snapshot().lifecycle, LifecycleState::Error(ErrorSeverity::Fatal));
    assert_eq!(h.engine.prepare_count(), 2);

    h.session.retry_last_request().unwrap();
    h.flush().await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Preparing);
    assert!(snapshot.error.is_none());
    assert_eq!(h.engine.prepare_count(), 3);

    h.fail();
    h.flush().await;
    assert_eq!(
        h.session.snapshot().lifecycle,
        LifecycleState::Error(ErrorSeverity::Recoverable)
    );
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_idle_is_retried_once() {
    let h = Harness::new();
    h.start_playing(LIVE_URL, ContentKind::Live).await;

    h.sink.emit(EngineEvent::state(EngineState::Idle));
    h.sink.emit(EngineEvent::state(EngineState::Idle));
    h.flush().await;

    let error = h.session.snapshot().error.unwrap();
    assert_eq!(error.code, "UNEXPECTED_STOP");
    assert_eq!(error.attempt, 1);

    wait_for_retry().await;
    h.flush().await;
    assert_eq!(h.engine.prepare_count(), 2);
}

// =============================================================================
// Stop Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_clears_snapshot_and_pending_retry() {
    let h = Harness::new();
    h.start_playing(LIVE_URL, ContentKind::Live).await;
    h.sink.emit(EngineEvent::tracks(tracks(2, 2)));
    h.fail();
    h.flush().await;

    h.session.stop().unwrap();
    h.flush().await;

    assert!(h.session.snapshot().is_empty());
    let calls = h.engine.calls();
    assert!(calls.contains(&EngineCall::Stop));
    assert!(calls.contains(&EngineCall::DetachSurface));
    assert_eq!(h.foreground.calls().last(), Some(&false));

    h.engine.clear_calls();
    h.sink.emit(EngineEvent::state(EngineState::Idle));
    tokio::time::sleep(Duration::from_secs(5)).await;
    h.flush().await;
    assert!(h.engine.calls().is_empty());
    assert!(h.session.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pause_keeps_request() {
    let h = Harness::new();
    h.start_playing(MOVIE_URL, ContentKind::Movie).await;

    h.session.toggle_play_pause().unwrap();
    h.sink.emit(EngineEvent::playing(false));
    h.sink.emit(EngineEvent::state(EngineState::Idle));
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Paused);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.request.map(|r| r.url), Some(MOVIE_URL.to_string()));
    assert!(h.engine.calls().contains(&EngineCall::Pause));

    h.session.toggle_play_pause().unwrap();
    h.flush().await;
    assert_eq!(h.engine.count(|c| matches!(c, EngineCall::Play)), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_releases_engine() {
    let h = Harness::new();
    h.session.play(LIVE_URL, ContentKind::Live).unwrap();
    h.flush().await;

    let Harness { session, engine, sink, .. } = h;
    drop(session);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(engine.calls().contains(&EngineCall::Release));
    assert!(sink.is_closed());
}

// =============================================================================
// Seek and Progress Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_seek_updates_position_immediately() {
    let h = Harness::new();
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();
    h.sink.emit(EngineEvent::state(EngineState::Ready));
    h.flush().await;

    h.session.seek(15_000).unwrap();
    h.flush().await;

    assert_eq!(h.session.snapshot().position_ms, 15_000);
    assert!(h.engine.calls().contains(&EngineCall::SeekTo(15_000)));
}

#[tokio::test(start_paused = true)]
async fn test_sampler_publishes_progress() {
    let h = Harness::new();
    h.engine.set_duration(Some(100_000));
    h.engine.set_position(Some(4_000));
    h.engine.set_buffered_position(Some(2_000));
    h.start_playing(MOVIE_URL, ContentKind::Movie).await;

    tokio::time::sleep(Duration::from_millis(501)).await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.position_ms, 4_000);
    assert_eq!(snapshot.duration_ms, Some(100_000));
    assert_eq!(snapshot.buffered_position_ms, 4_000);

    // Duration drops out, last known value stays
    h.engine.set_duration(None);
    h.engine.set_position(Some(-5));
    tokio::time::sleep(Duration::from_millis(500)).await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.duration_ms, Some(100_000));
}

// =============================================================================
// Track Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_track_changes_flip_dialog_options() {
    let h = Harness::new();
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();

    h.sink.emit(EngineEvent::tracks(tracks(1, 0)));
    h.flush().await;
    let view = h.session.snapshot().tracks;
    assert!(!view.has_dialog_options);
    assert!(view.text.is_empty());

    h.sink.emit(EngineEvent::tracks(tracks(2, 1)));
    h.flush().await;
    let snapshot = h.session.snapshot();
    let view = &snapshot.tracks;
    assert!(view.has_dialog_options);
    assert_eq!(view.audio.len(), 2);
    assert_eq!(view.audio[1].label, "ES");
    assert_eq!(view.text.len(), 2);
    assert_eq!(view.text.iter().filter(|o| o.id == SUBTITLES_OFF_ID).count(), 1);
    assert!(view.text[0].selected);
    assert_eq!(snapshot.selected_audio_id.as_deref(), Some("audio-1-0"));
    assert_eq!(snapshot.selected_subtitle_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_track_id_is_noop() {
    let h = Harness::new();
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();
    h.sink.emit(EngineEvent::tracks(tracks(2, 1)));
    h.flush().await;
    h.engine.clear_calls();
    let before = h.session.snapshot();

    h.session.select_audio_track("audio-9-9").unwrap();
    h.session.select_subtitle_track(Some("text-7-0")).unwrap();
    h.session.select_audio_track("text-2-0").unwrap();
    h.flush().await;

    assert!(h.engine.calls().is_empty());
    assert_eq!(h.session.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn test_audio_selection_protocol() {
    let h = Harness::new();
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();
    h.sink.emit(EngineEvent::tracks(tracks(3, 0)));
    h.flush().await;
    h.engine.clear_calls();

    h.session.select_audio_track("audio-1-2").unwrap();
    h.flush().await;

    assert_eq!(
        h.engine.calls(),
        vec![
            EngineCall::ClearTrackOverrides(TrackType::Audio),
            EngineCall::SetTrackOverride {
                track_type: TrackType::Audio,
                group: 1,
                track: 2
            },
        ]
    );
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.selected_audio_id.as_deref(), Some("audio-1-2"));
    assert_eq!(snapshot.tracks.audio.iter().filter(|o| o.selected).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_ids_rejected_after_new_request() {
    let h = Harness::new();
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();
    h.sink.emit(EngineEvent::tracks(tracks(2, 0)));
    h.flush().await;

    h.session.play(LIVE_URL, ContentKind::Live).unwrap();
    h.flush().await;
    h.engine.clear_calls();

    h.session.select_audio_track("audio-1-1").unwrap();
    h.flush().await;
    assert!(h.engine.calls().is_empty());
}

// =============================================================================
// Completion and Episode Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_movie_natural_end_is_not_retried() {
    let h = Harness::new();
    h.engine.set_duration(Some(60_000));
    h.engine.set_position(Some(59_400));
    h.start_playing(MOVIE_URL, ContentKind::Movie).await;

    h.sink.emit_all(vec![EngineEvent::playing(false), EngineEvent::state(EngineState::Ended)]);
    h.flush().await;
    wait_for_retry().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.lifecycle, LifecycleState::Ended);
    assert!(snapshot.error.is_none());
    assert_eq!(h.engine.prepare_count(), 1);
    assert_eq!(h.foreground.stops(), 1);

    h.session.resume().unwrap();
    h.flush().await;
    assert!(h.engine.calls().contains(&EngineCall::SeekTo(0)));
}

#[tokio::test(start_paused = true)]
async fn test_movie_early_end_is_retried() {
    let h = Harness::new();
    h.engine.set_duration(Some(60_000));
    h.engine.set_position(Some(20_000));
    h.start_playing(MOVIE_URL, ContentKind::Movie).await;

    h.sink.emit(EngineEvent::state(EngineState::Ended));
    h.flush().await;
    assert_eq!(
        h.session.snapshot().lifecycle,
        LifecycleState::Error(ErrorSeverity::Recoverable)
    );
}

#[tokio::test(start_paused = true)]
async fn test_live_end_is_retried() {
    let h = Harness::new();
    h.engine.set_duration(Some(10_000));
    h.engine.set_position(Some(10_000));
    h.start_playing(LIVE_URL, ContentKind::Live).await;

    h.sink.emit(EngineEvent::state(EngineState::Ended));
    h.flush().await;
    wait_for_retry().await;

    assert_eq!(h.session.snapshot().error.map(|e| e.code), Some("UNEXPECTED_STOP".to_string()));
    assert_eq!(h.engine.prepare_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_series_auto_advances() {
    let h = Harness::new();
    let episodes = vec![
        "http://vod.example/show/s01e01.mp4".to_string(),
        "http://vod.example/show/s01e02.mp4".to_string(),
    ];
    h.engine.set_duration(Some(1_800_000));
    h.engine.set_position(Some(1_799_000));

    h.session.play_series(episodes.clone(), 0).unwrap();
    h.sink.emit(EngineEvent::state(EngineState::Ready));
    h.flush().await;
    let cursor = h.session.snapshot().episode.unwrap();
    assert_eq!((cursor.index, cursor.count), (0, 2));
    assert!(cursor.has_next());

    h.sink.emit(EngineEvent::state(EngineState::Ended));
    h.flush().await;

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.request.map(|r| r.url), Some(episodes[1].clone()));
    assert_eq!(snapshot.lifecycle, LifecycleState::Preparing);
    assert_eq!(snapshot.episode.map(|c| c.index), Some(1));
    assert_eq!(h.engine.prepare_count(), 2);

    // Last episode: no further advance
    h.sink.emit(EngineEvent::state(EngineState::Ended));
    h.flush().await;
    assert_eq!(h.session.snapshot().lifecycle, LifecycleState::Ended);
    assert_eq!(h.engine.prepare_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_episode_navigation() {
    let h = Harness::new();
    let episodes: Vec<String> = (1..=3)
        .map(|i| format!("http://vod.example/show/e{}.mp4", i))
        .collect();

    h.session.play_series(episodes.clone(), 1).unwrap();
    h.session.previous_episode().unwrap();
    h.session.previous_episode().unwrap();
    h.flush().await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.request.map(|r| r.url), Some(episodes[0].clone()));
    assert_eq!(h.engine.prepare_count(), 2);

    // A plain movie request drops the queue
    h.session.play(MOVIE_URL, ContentKind::Movie).unwrap();
    h.session.next_episode().unwrap();
    h.flush().await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.episode, None);
    assert_eq!(snapshot.request.map(|r| r.url), Some(MOVIE_URL.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_series_start_index_counts_blank_entries() {
    let h = Harness::new();
    let episodes = vec![
        String::new(),
        "http://vod.example/show/e1.mp4".to_string(),
        "http://vod.example/show/e2.mp4".to_string(),
    ];

    h.session.play_series(episodes.clone(), 1).unwrap();
    h.flush().await;
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.request.map(|r| r.url), Some(episodes[1].clone()));
    let cursor = snapshot.episode.unwrap();
    assert_eq!((cursor.index, cursor.count), (0, 2));

    // A blank entry at the start index is not playable
    h.session.stop().unwrap();
    h.session.play_series(episodes, 0).unwrap();
    h.flush().await;
    assert!(h.session.snapshot().is_empty());
}
