//! Track catalog
//!
//! Turns the engine's raw track groups into selectable audio and subtitle
//! options with stable ids, and remembers which option is active.
//!
//! Ids are `audio-<group>-<index>` / `text-<group>-<index>`, where `group` is
//! the group's position in the engine report and `index` the track's position
//! inside it. An id only resolves against the catalog version that produced
//! it; every rebuild or clear starts a new version.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Id of the synthetic "subtitles off" option
pub const SUBTITLES_OFF_ID: &str = "text-off";

/// Track types reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    Audio,
    Text,
    Video,
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackType::Audio => write!(f, "audio"),
            TrackType::Text => write!(f, "text"),
            TrackType::Video => write!(f, "video"),
        }
    }
}

/// One track inside an engine track group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFormat {
    /// Engine label, if any
    pub label: Option<String>,
    /// BCP-47 language code
    pub language: Option<String>,
    /// Currently rendered by the engine
    pub selected: bool,
    /// Engine can decode this track
    pub supported: bool,
}

impl TrackFormat {
    pub fn new(label: Option<&str>, language: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            language: language.map(str::to_string),
            selected: false,
            supported: true,
        }
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_supported(mut self, supported: bool) -> Self {
        self.supported = supported;
        self
    }
}

/// A group of alternative tracks as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackGroup {
    pub track_type: TrackType,
    pub tracks: Vec<TrackFormat>,
}

impl TrackGroup {
    pub fn new(track_type: TrackType, tracks: Vec<TrackFormat>) -> Self {
        Self { track_type, tracks }
    }
}

/// Selectable option shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackOption {
    /// Opaque id, valid for one catalog version
    pub id: String,
    pub label: String,
    pub language: Option<String>,
    pub track_type: TrackType,
    pub selected: bool,
    /// The synthetic "off" entry of the subtitle list
    pub is_disable_option: bool,
}

/// Read-only catalog view published on the snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCatalogView {
    pub version: u64,
    pub audio: Vec<TrackOption>,
    /// Subtitle options, off option first when any exist
    pub text: Vec<TrackOption>,
    /// More than one choice exists for audio or text
    pub has_dialog_options: bool,
}

impl TrackCatalogView {
    pub fn selected_audio_id(&self) -> Option<String> {
        self.audio.iter().find(|o| o.selected).map(|o| o.id.clone())
    }

    /// Selected real subtitle track; `None` when subtitles are off
    pub fn selected_subtitle_id(&self) -> Option<String> {
        self.text
            .iter()
            .find(|o| o.selected && !o.is_disable_option)
            .map(|o| o.id.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.text.is_empty()
    }
}

/// Engine coordinates of a resolved option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSlot {
    pub track_type: TrackType,
    pub group: usize,
    pub index: usize,
}

/// Track catalog for the current media source
#[derive(Debug, Default)]
pub struct TrackCatalog {
    view: TrackCatalogView,
    slots: HashMap<String, TrackSlot>,
    /// Text rendering explicitly switched off
    text_disabled: bool,
}

impl TrackCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &TrackCatalogView {
        &self.view
    }

    pub fn version(&self) -> u64 {
        self.view.version
    }

    /// Rebuild from a fresh engine report
    pub fn rebuild(&mut self, groups: &[TrackGroup]) -> &TrackCatalogView {
        let mut audio = Vec::new();
        let mut text = Vec::new();
        let mut slots = HashMap::new();

        for (group_index, group) in groups.iter().enumerate() {
            let prefix = match group.track_type {
                TrackType::Audio => "audio",
                TrackType::Text => "text",
                TrackType::Video => continue,
            };
            for (track_index, format) in group.tracks.iter().enumerate() {
                if !format.supported {
                    continue;
                }
                let id = format!("{}-{}-{}", prefix, group_index, track_index);
                let options = match group.track_type {
                    TrackType::Audio => &mut audio,
                    _ => &mut text,
                };
                let selected = match group.track_type {
                    TrackType::Text => format.selected && !self.text_disabled,
                    _ => format.selected,
                };
                let ordinal = options.len() + 1;
                options.push(TrackOption {
                    label: display_label(format, group.track_type, ordinal),
                    id: id.clone(),
                    language: format.language.clone(),
                    track_type: group.track_type,
                    selected,
                    is_disable_option: false,
                });
                slots.insert(
                    id,
                    TrackSlot {
                        track_type: group.track_type,
                        group: group_index,
                        index: track_index,
                    },
                );
            }
        }

        keep_first_selected(&mut audio);
        keep_first_selected(&mut text);

        if !text.is_empty() {
            let off_selected = !text.iter().any(|o| o.selected);
            text.insert(0, off_option(off_selected));
        }

        let version = self.view.version + 1;
        self.view = TrackCatalogView {
            version,
            has_dialog_options: audio.len() > 1 || text.len() > 1,
            audio,
            text,
        };
        self.slots = slots;

        debug!(
            version,
            audio = self.view.audio.len(),
            text = self.view.text.len(),
            dialog = self.view.has_dialog_options,
            "Track catalog rebuilt"
        );

        &self.view
    }

    /// Look up `id` of `track_type` in the current version
    pub fn resolve(&self, track_type: TrackType, id: &str) -> Option<TrackSlot> {
        self.slots
            .get(id)
            .copied()
            .filter(|slot| slot.track_type == track_type)
    }

    /// Mark a resolved slot as the active one of its type
    pub fn mark_selected(&mut self, slot: TrackSlot) {
        let target = self
            .slots
            .iter()
            .find(|(_, s)| **s == slot)
            .map(|(id, _)| id.clone());
        let options = match slot.track_type {
            TrackType::Audio => &mut self.view.audio,
            TrackType::Text => &mut self.view.text,
            TrackType::Video => return,
        };
        for option in options.iter_mut() {
            option.selected = Some(&option.id) == target.as_ref();
        }
        if slot.track_type == TrackType::Text {
            self.text_disabled = false;
        }
    }

    /// Switch subtitles off
    pub fn mark_text_disabled(&mut self) {
        self.text_disabled = true;
        for option in self.view.text.iter_mut() {
            option.selected = option.is_disable_option;
        }
    }

    /// Drop every option; outstanding ids become stale
    pub fn clear(&mut self) {
        let version = self.view.version + 1;
        self.view = TrackCatalogView {
            version,
            ..Default::default()
        };
        self.slots.clear();
        self.text_disabled = false;
    }
}

fn off_option(selected: bool) -> TrackOption {
    TrackOption {
        id: SUBTITLES_OFF_ID.to_string(),
        label: "Off".to_string(),
        language: None,
        track_type: TrackType::Text,
        selected,
        is_disable_option: true,
    }
}

fn keep_first_selected(options: &mut [TrackOption]) {
    let mut seen = false;
    for option in options.iter_mut() {
        if option.selected {
            option.selected = !seen;
            seen = true;
        }
    }
}

fn display_label(format: &TrackFormat, track_type: TrackType, ordinal: usize) -> String {
    let non_blank = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(label) = non_blank(&format.label) {
        return label;
    }
    if let Some(language) = non_blank(&format.language) {
        return language.to_uppercase();
    }
    match track_type {
        TrackType::Audio => format!("Audio {}", ordinal),
        _ => format!("Subtitle {}", ordinal),
    }
}
