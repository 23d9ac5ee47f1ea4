//! Vista CLI - Headless playback session driver
//!
//! Features:
//! - Run a playback session against a simulated engine
//! - Exercise recovery, seeking, track selection and episode queues
//! - Print and validate session configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod simulator;

use commands::SimulateArgs;
use output::OutputFormat;

/// Vista CLI - Playback session toolkit
#[derive(Parser)]
#[command(name = "vista-cli")]
#[command(author = "Vista Media")]
#[command(version)]
#[command(about = "Drive and inspect playback sessions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a stream on the simulated engine and report what the session does
    Simulate {
        /// Stream URL (first episode when --episode is given)
        url: String,

        /// Content kind (live, movie, series)
        #[arg(short, long, default_value = "live")]
        kind: String,

        /// Loads that fail before the stream comes up
        #[arg(long, default_value = "0")]
        failures: u32,

        /// Content duration in seconds (ignored for live)
        #[arg(short, long, default_value = "30")]
        duration_secs: u64,

        /// Seek to this position (ms) once playing
        #[arg(long)]
        seek: Option<i64>,

        /// Audio tracks offered by the stream
        #[arg(long, default_value = "2")]
        audio_tracks: usize,

        /// Subtitle tracks offered by the stream
        #[arg(long, default_value = "1")]
        text_tracks: usize,

        /// Select this audio track id once playing
        #[arg(long)]
        audio: Option<String>,

        /// Select this subtitle track id once playing ("text-off" disables)
        #[arg(long)]
        subtitle: Option<String>,

        /// Additional episodes queued after URL
        #[arg(short, long)]
        episode: Vec<String>,

        /// Stop after this many seconds
        #[arg(short, long, default_value = "20")]
        run_secs: u64,

        /// Session configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration or validate a file
    Config {
        /// Configuration file to validate
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = OutputFormat::from(cli.format.as_str());

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr);
    if format == OutputFormat::Json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    vista_core::init();

    match cli.command {
        Commands::Simulate {
            url,
            kind,
            failures,
            duration_secs,
            seek,
            audio_tracks,
            text_tracks,
            audio,
            subtitle,
            episode,
            run_secs,
            config,
        } => {
            let args = SimulateArgs {
                url,
                kind: kind.parse()?,
                failures,
                duration_secs,
                seek,
                audio_tracks,
                text_tracks,
                audio,
                subtitle,
                episodes: episode,
                run_secs,
                config,
            };
            commands::simulate(args, format).await?;
        }
        Commands::Config { check } => {
            commands::config(check, format)?;
        }
    }

    Ok(())
}
