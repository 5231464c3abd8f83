use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Point;

pub type RegionId = Uuid;
pub type ExerciseId = Uuid;

/// Opaque handle to audio owned by the audio collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AudioRef(String);

impl AudioRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AudioRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistence status of the in-memory copy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SaveState {
    #[default]
    Saved,
    Pending,
    Failed,
}

/// Which annotations a region carries, used for colouring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Complete,
    AudioOnly,
    TextOnly,
    Empty,
}

impl ContentKind {
    pub fn all() -> &'static [ContentKind] {
        &[
            ContentKind::Complete,
            ContentKind::AudioOnly,
            ContentKind::TextOnly,
            ContentKind::Empty,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Complete => "Text + Audio",
            ContentKind::AudioOnly => "Audio",
            ContentKind::TextOnly => "Text",
            ContentKind::Empty => "Empty",
        }
    }
}

/// A labeled circular target on the exercise image.
///
/// Text and audio are private: `has_text`/`has_audio` are always derived from
/// them, and changes go through [`RegionPatch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    pub owner_id: ExerciseId,
    pub center: Point,
    radius: u32,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<AudioRef>,
    #[serde(skip)]
    save_state: SaveState,
}

impl Region {
    pub(crate) fn new(owner_id: ExerciseId, center: Point, radius: u32, label: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            center: center.rounded(),
            radius,
            label,
            text: None,
            audio: None,
            save_state: SaveState::Pending,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }

    pub fn has_text(&self) -> bool {
        self.text().is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn content_kind(&self) -> ContentKind {
        match (self.has_text(), self.has_audio()) {
            (true, true) => ContentKind::Complete,
            (false, true) => ContentKind::AudioOnly,
            (true, false) => ContentKind::TextOnly,
            (false, false) => ContentKind::Empty,
        }
    }

    /// Check whether a point lies on or inside the circle
    pub fn contains(&self, point: Point) -> bool {
        self.center.distance_to(point) <= self.radius as f64
    }

    pub(crate) fn set_radius(&mut self, radius: u32) {
        self.radius = radius;
    }

    pub(crate) fn set_save_state(&mut self, state: SaveState) {
        self.save_state = state;
    }

    pub(crate) fn apply(&mut self, patch: RegionPatch) {
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(text) = patch.text {
            self.text = if text.trim().is_empty() { None } else { Some(text) };
        }
        if let Some(audio) = patch.audio {
            self.audio = audio;
        }
    }
}

/// Partial update for a region; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionPatch {
    pub label: Option<String>,
    pub text: Option<String>,
    pub audio: Option<Option<AudioRef>>,
}

impl RegionPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn audio(audio: AudioRef) -> Self {
        Self {
            audio: Some(Some(audio)),
            ..Self::default()
        }
    }

    pub fn clear_audio() -> Self {
        Self {
            audio: Some(None),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
