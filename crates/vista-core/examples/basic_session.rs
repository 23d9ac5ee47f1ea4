//! Basic playback session example
//!
//! Drives a session with the recording engine: load a movie, report it ready,
//! list its tracks and recover from one dropped connection.
//!
//! Run with: cargo run -p vista-core --example basic_session

use std::sync::Arc;
use std::time::Duration;
use vista_core::{
    event_channel, ContentKind, EngineEvent, EngineState, MockEngine, NoopForeground,
    PlaybackSession, SessionConfig, TrackFormat, TrackGroup, TrackOption, TrackType,
};

#[tokio::main]
async fn main() -> vista_core::Result<()> {
    println!("Vista Core - Basic Session Example");
    println!("==================================\n");

    let engine = Arc::new(MockEngine::new());
    engine.set_duration(Some(7_200_000));
    let (sink, events) = event_channel();

    let config = SessionConfig::from_json(r#"{"retry": {"max_attempts": 3, "delay_ms": 250}}"#)?;
    let session = PlaybackSession::spawn(engine.clone(), events, Arc::new(NoopForeground), config)?;

    session.play("http://vod.example/movies/arrival.mp4", ContentKind::Movie)?;
    sink.emit(EngineEvent::state(EngineState::Buffering));
    sink.emit_all(vec![
        EngineEvent::state(EngineState::Ready),
        EngineEvent::playing(true),
        EngineEvent::tracks(vec![
            TrackGroup::new(
                TrackType::Audio,
                vec![
                    TrackFormat::new(Some("English 5.1"), Some("en")).with_selected(true),
                    TrackFormat::new(None, Some("es")),
                ],
            ),
            TrackGroup::new(TrackType::Text, vec![TrackFormat::new(None, Some("en"))]),
        ]),
    ]);
    session.flush().await?;

    let snapshot = session.snapshot();
    println!("State:    {}", snapshot.lifecycle);
    println!("Audio:");
    print_options(&snapshot.tracks.audio);
    println!("Subtitles:");
    print_options(&snapshot.tracks.text);

    session.select_audio_track("audio-0-1")?;
    session.seek(600_000)?;
    session.flush().await?;
    println!("\nSelected: {:?}", session.snapshot().selected_audio_id);
    println!("Position: {} ms", session.snapshot().position_ms);

    sink.emit(EngineEvent::error("SOURCE_IO", "connection reset"));
    session.flush().await?;
    if let Some(error) = session.snapshot().error {
        println!("\nError:    {}", error.message);
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    sink.emit_all(vec![EngineEvent::state(EngineState::Ready), EngineEvent::FirstFrameRendered]);
    session.flush().await?;
    println!(
        "Recovered: {} (engine prepared {} times)",
        session.snapshot().lifecycle,
        engine.prepare_count()
    );

    session.release().await?;
    Ok(())
}

fn print_options(options: &[TrackOption]) {
    for option in options {
        let mark = if option.selected { "x" } else { " " };
        println!("  [{}] {} ({})", mark, option.label, option.id);
    }
}
