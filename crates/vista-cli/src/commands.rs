//! CLI command implementations

use crate::output::{print_report, print_transition, to_json, OutputFormat};
use crate::simulator::{SimProfile, SimulatedEngine};
use anyhow::Context;
use async_trait::async_trait;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;
use vista_core::{
    event_channel, ContentKind, ErrorSeverity, ForegroundCoordinator, LifecycleState,
    PlaybackSession, SessionConfig,
};

/// Arguments of the `simulate` command
#[derive(Debug, Clone)]
pub struct SimulateArgs {
    pub url: String,
    pub kind: ContentKind,
    pub failures: u32,
    pub duration_secs: u64,
    pub seek: Option<i64>,
    pub audio_tracks: usize,
    pub text_tracks: usize,
    pub audio: Option<String>,
    pub subtitle: Option<String>,
    pub episodes: Vec<String>,
    pub run_secs: u64,
    pub config: Option<PathBuf>,
}

/// Foreground coordinator that only logs
struct ConsoleForeground;

#[async_trait]
impl ForegroundCoordinator for ConsoleForeground {
    async fn notify_audible(&self, audible: bool) {
        if audible {
            info!("Foreground service started");
        } else {
            info!("Foreground service stopped");
        }
    }
}

/// Load a configuration file, or the defaults without one
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = SessionConfig::from_json(&json)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Run a session against the simulated engine
pub async fn simulate(args: SimulateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let profile = SimProfile {
        failures: args.failures,
        duration_ms: args.kind.is_finite().then(|| args.duration_secs * 1_000),
        audio_tracks: args.audio_tracks,
        text_tracks: args.text_tracks,
        ..Default::default()
    };

    info!(
        url = %args.url,
        kind = %args.kind,
        failures = args.failures,
        max_attempts = config.retry.max_attempts,
        "Starting simulation"
    );

    let (sink, events) = event_channel();
    let engine = Arc::new(SimulatedEngine::new(sink, profile));
    let session = PlaybackSession::spawn(engine, events, Arc::new(ConsoleForeground), config)?;
    let mut rx = session.subscribe();

    if args.episodes.is_empty() {
        session.play(args.url.as_str(), args.kind)?;
    } else {
        let mut episodes = vec![args.url.clone()];
        episodes.extend(args.episodes.iter().cloned());
        session.play_series(episodes, 0)?;
    }

    let started = Instant::now();
    let deadline = tokio::time::sleep(Duration::from_secs(args.run_secs));
    tokio::pin!(deadline);

    let mut last_state = None;
    let mut last_episode = None;
    let mut actions_applied = false;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!(run_secs = args.run_secs, "Run time elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                let episode = snapshot.episode.map(|cursor| cursor.index);

                if last_state != Some(snapshot.lifecycle) || last_episode != episode {
                    print_transition(started.elapsed().as_millis(), &snapshot, format);
                    last_state = Some(snapshot.lifecycle);
                    last_episode = episode;
                }

                if !actions_applied && snapshot.lifecycle == LifecycleState::Playing {
                    actions_applied = true;
                    apply_actions(&session, &args)?;
                }

                match snapshot.lifecycle {
                    LifecycleState::Error(ErrorSeverity::Fatal) => break,
                    LifecycleState::Ended if !snapshot.episode.is_some_and(|c| c.has_next()) => {
                        break
                    }
                    _ => {}
                }
            }
        }
    }

    session.flush().await?;
    print_report(&session.snapshot(), format);
    session.release().await?;
    Ok(())
}

fn apply_actions(session: &PlaybackSession, args: &SimulateArgs) -> anyhow::Result<()> {
    if let Some(position) = args.seek {
        info!(position, "Seeking");
        session.seek(position)?;
    }
    if let Some(id) = &args.audio {
        info!(id = %id, "Selecting audio track");
        session.select_audio_track(id.as_str())?;
    }
    if let Some(id) = &args.subtitle {
        info!(id = %id, "Selecting subtitle track");
        session.select_subtitle_track(Some(id.as_str()))?;
    }
    Ok(())
}

/// Print the default configuration or validate a file
pub fn config(check: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let Some(path) = check else {
        println!("{}", to_json(&SessionConfig::default()));
        return Ok(());
    };

    let config = load_config(Some(&path))?;
    match format {
        OutputFormat::Json => println!("{}", to_json(&config)),
        OutputFormat::Text | OutputFormat::Table => {
            println!("{} {}", style("valid").green().bold(), path.display());
            println!(
                "  retry:           {} attempts, {} ms apart",
                config.retry.max_attempts, config.retry.delay_ms
            );
            println!("  sample interval: {} ms", config.sample_interval_ms);
            println!("  end tolerance:   {} ms", config.end_of_stream_tolerance_ms);
            println!("  auto-advance:    {}", config.auto_advance_episodes);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "vista-cli-{}-{}.json",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let path = write_temp("ok", r#"{"retry": {"max_attempts": 5}, "sample_interval_ms": 250}"#);
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay_ms, 2000);
        assert_eq!(config.sample_interval_ms, 250);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let path = write_temp("bad", r#"{"sample_interval_ms": 0}"#);
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
        std::fs::remove_file(path).ok();

        assert!(load_config(Some(Path::new("/nonexistent/vista.json"))).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_recovers_and_finishes() {
        let args = SimulateArgs {
            url: "http://sim.example/movie.mp4".into(),
            kind: ContentKind::Movie,
            failures: 2,
            duration_secs: 5,
            seek: Some(2_000),
            audio_tracks: 2,
            text_tracks: 1,
            audio: Some("audio-1-1".into()),
            subtitle: Some("text-2-0".into()),
            episodes: Vec::new(),
            run_secs: 60,
            config: None,
        };
        simulate(args, OutputFormat::Json).await.unwrap();
    }
}
