//! Output formatting for CLI

use console::style;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use vista_core::{ErrorSeverity, LifecycleState, PlaybackSnapshot, TrackOption};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Pretty JSON, falling back to an empty object
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// One line per lifecycle change
pub fn print_transition(elapsed_ms: u128, snapshot: &PlaybackSnapshot, format: OutputFormat) {
    if format == OutputFormat::Json {
        let line = serde_json::json!({
            "at_ms": elapsed_ms,
            "lifecycle": snapshot.lifecycle,
            "position_ms": snapshot.position_ms,
            "error": snapshot.error.as_ref().map(|e| &e.message),
        });
        println!("{}", line);
        return;
    }

    let label = style(snapshot.lifecycle.to_string());
    let state = match snapshot.lifecycle {
        LifecycleState::Playing => label.green(),
        LifecycleState::Error(ErrorSeverity::Fatal) => label.red().bold(),
        LifecycleState::Error(ErrorSeverity::Recoverable) => label.yellow(),
        _ => label.cyan(),
    };
    let mut line = format!("[{:>6} ms] {}", elapsed_ms, state);
    if let Some(error) = &snapshot.error {
        line.push_str(&format!("  {}", style(&error.message).dim()));
    }
    if let Some(cursor) = snapshot.episode {
        line.push_str(&format!("  episode {}/{}", cursor.index + 1, cursor.count));
    }
    println!("{}", line);
}

#[derive(Tabled)]
struct TrackRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Selected")]
    selected: String,
}

impl From<&TrackOption> for TrackRow {
    fn from(option: &TrackOption) -> Self {
        Self {
            id: option.id.clone(),
            kind: option.track_type.to_string(),
            label: option.label.clone(),
            language: option.language.clone().unwrap_or_else(|| "-".to_string()),
            selected: if option.selected { "*".to_string() } else { String::new() },
        }
    }
}

/// Render the track catalog as a table
pub fn tracks_table(snapshot: &PlaybackSnapshot) -> String {
    let rows: Vec<TrackRow> = snapshot
        .tracks
        .audio
        .iter()
        .chain(snapshot.tracks.text.iter())
        .map(TrackRow::from)
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Final session report
pub fn print_report(snapshot: &PlaybackSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(snapshot)),
        OutputFormat::Text | OutputFormat::Table => {
            println!("\n{}", style("Session Report").bold());
            println!("  State:    {}", snapshot.lifecycle);
            if let Some(request) = &snapshot.request {
                println!("  Request:  {} ({})", request.url, request.kind);
            }
            match snapshot.duration_ms {
                Some(duration) => {
                    println!("  Position: {} / {} ms", snapshot.position_ms, duration)
                }
                None => println!("  Position: {} ms", snapshot.position_ms),
            }
            println!("  Buffered: {} ms", snapshot.buffered_position_ms);
            if let Some(error) = &snapshot.error {
                println!("  Error:    {} ({})", error.message, error.code);
            }
            if !snapshot.tracks.is_empty() {
                println!("\n{}", tracks_table(snapshot));
            }
        }
    }
}
