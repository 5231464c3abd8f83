//! Routes classified gestures to actions, per mode and hit result

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RegionError;
use crate::feedback::{HighlightFeedback, RevealBox};
use crate::gesture::Gesture;
use crate::model::{AudioRef, Point, RegionId};
use crate::quiz::{AnswerOutcome, QuizSession, QuizSummary};
use crate::region_index::RegionIndex;
use crate::settings::RadiusSettings;
use crate::store::{Outbox, PersistOp};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Author regions
    Edit,
    /// Self-directed review
    #[default]
    Practice,
    /// Scored quiz
    Deepening,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Edit => "EDIT",
            Mode::Practice => "PRACTICE",
            Mode::Deepening => "DEEPENING",
        }
    }
}

/// Something the front-end has to do in response to a gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenTextEditor { region: RegionId },
    OpenAudioEditor { region: RegionId },
    /// Ask before deleting; the owner deletes once confirmed
    ConfirmDelete { region: RegionId, label: String },
    /// Short feedback sound for a practice tap
    PlayCue,
    PlayAudio(AudioRef),
    NoContent { region: RegionId },
    /// Brief ring where a region was just created
    Pulse(Point),
    Answered { correct: bool },
    QuizFinished(QuizSummary),
    LabelsExhausted,
}

/// Mutable state a dispatch may touch, lent by the owner for one call
pub struct DispatchTargets<'a> {
    pub index: &'a mut RegionIndex,
    pub outbox: &'a mut Outbox,
    pub quiz: Option<&'a mut QuizSession>,
    pub reveal: &'a mut RevealBox,
    pub highlight: &'a mut HighlightFeedback,
}

#[derive(Debug, Clone)]
pub struct ModeDispatcher {
    mode: Mode,
    radius: RadiusSettings,
    default_radius: u32,
}

impl ModeDispatcher {
    pub fn new(radius: RadiusSettings) -> Self {
        Self {
            mode: Mode::default(),
            radius,
            default_radius: radius.clamp(radius.initial),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::info!("mode {} -> {}", self.mode.as_str(), mode.as_str());
        }
        self.mode = mode;
    }

    /// Radius given to regions created from now on
    pub fn default_radius(&self) -> u32 {
        self.default_radius
    }

    pub fn increase_radius(&mut self) -> u32 {
        self.default_radius = (self.default_radius + self.radius.step).min(self.radius.max);
        self.default_radius
    }

    pub fn decrease_radius(&mut self) -> u32 {
        self.default_radius = self
            .default_radius
            .saturating_sub(self.radius.step)
            .max(self.radius.min);
        self.default_radius
    }

    pub fn reset_radius(&mut self) {
        self.default_radius = self.radius.clamp(self.radius.initial);
    }

    /// Hit-test against the index as it is now and act on the result
    pub fn dispatch(
        &mut self,
        gesture: Gesture,
        targets: DispatchTargets<'_>,
        now: Duration,
    ) -> Vec<Effect> {
        let Some(point) = gesture.point() else {
            return Vec::new();
        };
        let hit = targets.index.hit_test(point).map(|r| r.id);
        tracing::debug!(
            "dispatch {:?} in {} hit={:?}",
            gesture,
            self.mode.as_str(),
            hit
        );

        match self.mode {
            Mode::Edit => self.dispatch_edit(gesture, point, hit, targets),
            Mode::Practice => Self::dispatch_practice(gesture, hit, targets, now),
            Mode::Deepening => Self::dispatch_deepening(gesture, hit, targets, now),
        }
    }

    fn dispatch_edit(
        &self,
        gesture: Gesture,
        point: Point,
        hit: Option<RegionId>,
        targets: DispatchTargets<'_>,
    ) -> Vec<Effect> {
        match (gesture, hit) {
            (Gesture::LongPress(_), None) => {
                match targets.index.create(point, self.default_radius, None) {
                    Ok(region) => {
                        let id = region.id;
                        let center = region.center;
                        targets.outbox.push(PersistOp::Create(id));
                        vec![Effect::Pulse(center)]
                    }
                    Err(RegionError::LabelSpaceExhausted { last }) => {
                        tracing::warn!("cannot create region, labels exhausted after {}", last);
                        vec![Effect::LabelsExhausted]
                    }
                    Err(e) => {
                        tracing::warn!("cannot create region: {}", e);
                        Vec::new()
                    }
                }
            }
            (Gesture::LongPress(_), Some(region)) => vec![Effect::OpenAudioEditor { region }],
            (Gesture::DoubleTap(_), Some(region)) => vec![Effect::OpenTextEditor { region }],
            (Gesture::Tap(_), Some(region)) => {
                let label = targets
                    .index
                    .get(region)
                    .map(|r| r.label().to_string())
                    .unwrap_or_default();
                vec![Effect::ConfirmDelete { region, label }]
            }
            _ => Vec::new(),
        }
    }

    fn dispatch_practice(
        gesture: Gesture,
        hit: Option<RegionId>,
        targets: DispatchTargets<'_>,
        now: Duration,
    ) -> Vec<Effect> {
        let Some(region) = hit.and_then(|id| targets.index.get(id)) else {
            return Vec::new();
        };

        match gesture {
            Gesture::Tap(_) => {
                targets.reveal.show(region, now);
                vec![Effect::PlayCue]
            }
            Gesture::DoubleTap(_) => {
                let mut effects = Vec::new();
                if region.has_text() {
                    targets.reveal.show(region, now);
                }
                if let Some(audio) = region.audio() {
                    effects.push(Effect::PlayAudio(audio.clone()));
                }
                if !region.has_text() && !region.has_audio() {
                    effects.push(Effect::NoContent { region: region.id });
                }
                effects
            }
            _ => Vec::new(),
        }
    }

    fn dispatch_deepening(
        gesture: Gesture,
        hit: Option<RegionId>,
        targets: DispatchTargets<'_>,
        now: Duration,
    ) -> Vec<Effect> {
        if !matches!(gesture, Gesture::Tap(_)) {
            return Vec::new();
        }
        let Some(quiz) = targets.quiz else {
            return Vec::new();
        };

        match quiz.check_answer(hit, now) {
            AnswerOutcome::Correct => vec![Effect::Answered { correct: true }],
            AnswerOutcome::Wrong { highlight } => {
                if let Some(region) = highlight {
                    targets.highlight.start(region, now);
                }
                vec![Effect::Answered { correct: false }]
            }
            AnswerOutcome::Ignored => Vec::new(),
        }
    }
}
