use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::{earliest, Clock, SystemClock};
use crate::dispatch::{DispatchTargets, Effect, Mode, ModeDispatcher};
use crate::error::{QuizError, RegionError, StoreError};
use crate::feedback::{HighlightFeedback, RevealBox, Revealed};
use crate::gesture::{Gesture, GestureClassifier, PointerEvent};
use crate::model::{AudioRef, Exercise, Point, Region, RegionId, RegionPatch};
use crate::quiz::{ContentMode, QuizProgress, QuizSession, QuizSummary, TaskPrompt};
use crate::region_index::RegionIndex;
use crate::settings::Settings;
use crate::store::{FlushReport, Outbox, PersistOp, RegionStore};

/// Highlighted region as the renderer should draw it this frame
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightFrame {
    pub region: RegionId,
    pub center: Point,
    pub label: String,
    /// Highlighted when true, normal when false
    pub on: bool,
    pub radius: u32,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub regions: Vec<Region>,
    pub mode: Mode,
    /// Regions are only drawn while editing
    pub show_regions: bool,
    pub highlight: Option<HighlightFrame>,
    pub default_radius: u32,
}

/// Platform-agnostic application state.
///
/// Owns the region index and every state machine around it. Front-ends feed
/// it pointer events and ticks, then drain effects and render requests.
pub struct App {
    settings: Settings,
    clock: Box<dyn Clock>,
    rng: StdRng,

    exercise: Option<Exercise>,
    index: RegionIndex,
    classifier: GestureClassifier,
    dispatcher: ModeDispatcher,

    quiz: Option<QuizSession>,
    last_summary: Option<QuizSummary>,
    highlight: HighlightFeedback,
    reveal: RevealBox,

    outbox: Outbox,
    effects: Vec<Effect>,
    needs_render: bool,

    pub status_message: Option<String>,
    pub running: bool,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self::build(settings, Box::new(SystemClock::new()), StdRng::from_entropy())
    }

    /// App driven by an injected clock and a seeded sampler
    pub fn with_clock(settings: Settings, clock: Box<dyn Clock>, seed: u64) -> Self {
        Self::build(settings, clock, StdRng::seed_from_u64(seed))
    }

    fn build(settings: Settings, clock: Box<dyn Clock>, rng: StdRng) -> Self {
        Self {
            clock,
            rng,
            exercise: None,
            index: RegionIndex::detached(settings.radius),
            classifier: GestureClassifier::new(settings.gesture),
            dispatcher: ModeDispatcher::new(settings.radius),
            quiz: None,
            last_summary: None,
            highlight: HighlightFeedback::new(&settings.feedback),
            reveal: RevealBox::new(&settings.feedback),
            outbox: Outbox::new(),
            effects: Vec::new(),
            needs_render: false,
            status_message: None,
            running: true,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    pub fn index(&self) -> &RegionIndex {
        &self.index
    }

    pub fn mode(&self) -> Mode {
        self.dispatcher.mode()
    }

    pub fn default_radius(&self) -> u32 {
        self.dispatcher.default_radius()
    }

    // ========================================================================
    // Exercises
    // ========================================================================

    /// Show an exercise with the given regions. Starts in practice mode with
    /// the default radius reset.
    ///
    /// Pending storage operations of the previous exercise are dropped, so
    /// flush before switching.
    pub fn open_exercise(&mut self, exercise: Exercise, regions: Vec<Region>) {
        tracing::info!(
            "opening exercise '{}' with {} regions",
            exercise.name,
            regions.len()
        );
        if !self.outbox.is_empty() {
            tracing::warn!("dropping {} unflushed operations", self.outbox.len());
            self.outbox.clear();
        }

        self.index.load(exercise.id, regions);
        self.exercise = Some(exercise);
        self.reset_interaction();
        self.dispatcher.set_mode(Mode::Practice);
        self.dispatcher.reset_radius();
        self.needs_render = true;
    }

    /// Flush pending writes, then load the exercise's regions from `store`
    pub fn load_exercise(
        &mut self,
        exercise: Exercise,
        store: &mut dyn RegionStore,
    ) -> Result<(), StoreError> {
        self.flush(store);
        let regions = store.list_regions(exercise.id)?;
        self.open_exercise(exercise, regions);
        Ok(())
    }

    fn reset_interaction(&mut self) {
        self.classifier.reset();
        self.quiz = None;
        self.last_summary = None;
        self.highlight = HighlightFeedback::new(&self.settings.feedback);
        self.reveal.close();
    }

    // ========================================================================
    // Modes and radius
    // ========================================================================

    /// Switch mode. Leaving deepening ends the running quiz.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode() {
            return;
        }
        self.classifier.reset();
        self.reveal.close();
        if mode != Mode::Deepening {
            self.quiz = None;
        }
        self.dispatcher.set_mode(mode);
        self.needs_render = true;
    }

    pub fn increase_radius(&mut self) -> u32 {
        self.needs_render = true;
        self.dispatcher.increase_radius()
    }

    pub fn decrease_radius(&mut self) -> u32 {
        self.needs_render = true;
        self.dispatcher.decrease_radius()
    }

    // ========================================================================
    // Input and time
    // ========================================================================

    /// Feed a pointer event in image coordinates
    pub fn pointer(&mut self, event: PointerEvent) {
        if self.exercise.is_none() {
            return;
        }
        let now = self.clock.now();
        self.advance(now);
        for gesture in self.classifier.handle(event, now) {
            self.apply_gesture(gesture, now);
        }
    }

    /// Fire every timer that is due
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.advance(now);
    }

    /// When the next timer is due, for the front-end's poll timeout
    pub fn next_deadline(&self) -> Option<Duration> {
        earliest([
            self.classifier.next_deadline(),
            self.highlight.next_deadline(),
            self.reveal.next_deadline(),
            self.quiz.as_ref().and_then(|q| q.next_deadline()),
        ])
    }

    /// Fire due timers in deadline order, each at its own deadline
    fn advance(&mut self, now: Duration) {
        while let Some(at) = self.next_deadline().filter(|d| *d <= now) {
            // Advance the quiz before a tap on the same deadline answers it
            self.tick_quiz(at);
            if self.highlight.tick(at) {
                self.needs_render = true;
            }
            if self.reveal.tick(at) {
                self.needs_render = true;
            }
            for gesture in self.classifier.tick(at) {
                self.apply_gesture(gesture, at);
            }
        }
    }

    fn tick_quiz(&mut self, at: Duration) {
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        match quiz.tick(at) {
            Some(QuizProgress::Advanced { .. }) => self.needs_render = true,
            Some(QuizProgress::Finished(summary)) => {
                self.quiz = None;
                self.last_summary = Some(summary);
                self.effects.push(Effect::QuizFinished(summary));
                self.needs_render = true;
            }
            None => {}
        }
    }

    fn apply_gesture(&mut self, gesture: Gesture, now: Duration) {
        if gesture == Gesture::Cancelled {
            tracing::debug!("gesture cancelled");
            return;
        }
        let targets = DispatchTargets {
            index: &mut self.index,
            outbox: &mut self.outbox,
            quiz: self.quiz.as_mut(),
            reveal: &mut self.reveal,
            highlight: &mut self.highlight,
        };
        let effects = self.dispatcher.dispatch(gesture, targets, now);
        self.effects.extend(effects);
        self.needs_render = true;
    }

    // ========================================================================
    // Region edits
    // ========================================================================

    /// Delete a region once the user confirmed it
    pub fn confirm_delete(&mut self, id: RegionId) -> bool {
        if self.index.remove(id).is_none() {
            return false;
        }
        self.outbox.push(PersistOp::Delete(id));
        self.needs_render = true;
        true
    }

    /// Save the text editor. Both fields are trimmed; an empty label keeps
    /// the current one.
    pub fn save_text(&mut self, id: RegionId, label: &str, text: &str) -> Result<(), RegionError> {
        let mut patch = RegionPatch::text(text.trim());
        let label = label.trim();
        if !label.is_empty() {
            patch = patch.with_label(label);
        }
        self.index.update(id, patch)?;
        self.outbox.push(PersistOp::Update(id));
        self.needs_render = true;
        Ok(())
    }

    /// Attach audio to a region, or remove it with `None`
    pub fn save_audio(&mut self, id: RegionId, audio: Option<AudioRef>) -> Result<(), RegionError> {
        let patch = match audio {
            Some(audio) => RegionPatch::audio(audio),
            None => RegionPatch::clear_audio(),
        };
        self.index.update(id, patch)?;
        self.outbox.push(PersistOp::Update(id));
        self.needs_render = true;
        Ok(())
    }

    // ========================================================================
    // Quiz
    // ========================================================================

    /// Switch to deepening and start a quiz over the current regions
    pub fn start_quiz(&mut self, mode: ContentMode, task_count: usize) -> Result<(), QuizError> {
        let session = QuizSession::start(
            &self.index,
            mode,
            task_count,
            self.settings.feedback.advance_delay(),
            &mut self.rng,
        )?;
        self.set_mode(Mode::Deepening);
        self.quiz = Some(session);
        self.last_summary = None;
        self.needs_render = true;
        Ok(())
    }

    /// End the quiz early and report the score so far
    pub fn stop_quiz(&mut self) -> Result<QuizSummary, QuizError> {
        let quiz = self.quiz.take().ok_or(QuizError::NoActiveSession)?;
        let summary = quiz.summary();
        self.last_summary = Some(summary);
        self.needs_render = true;
        Ok(summary)
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    pub fn current_task(&self) -> Option<TaskPrompt> {
        self.quiz.as_ref()?.current_task(&self.index)
    }

    /// Summary of the last finished or stopped quiz
    pub fn last_summary(&self) -> Option<QuizSummary> {
        self.last_summary
    }

    // ========================================================================
    // Reveal box
    // ========================================================================

    pub fn revealed(&self) -> Option<&Revealed> {
        self.reveal.content()
    }

    pub fn close_reveal(&mut self) {
        if self.reveal.content().is_some() {
            self.reveal.close();
            self.needs_render = true;
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Render request if anything changed since the last one
    pub fn take_render_request(&mut self) -> Option<RenderRequest> {
        if !self.needs_render {
            return None;
        }
        self.needs_render = false;
        Some(self.render_request())
    }

    pub fn render_request(&self) -> RenderRequest {
        let mode = self.mode();
        let highlight = self.highlight.state().and_then(|state| {
            let region = self.index.get(state.region)?;
            Some(HighlightFrame {
                region: region.id,
                center: region.center,
                label: region.label().to_string(),
                on: state.on,
                radius: self.settings.feedback.highlight_radius,
            })
        });

        RenderRequest {
            regions: self.index.regions().to_vec(),
            mode,
            show_regions: mode == Mode::Edit,
            highlight,
            default_radius: self.default_radius(),
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn has_pending_writes(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Write queued changes to `store`
    pub fn flush(&mut self, store: &mut dyn RegionStore) -> FlushReport {
        if self.outbox.is_empty() {
            return FlushReport::default();
        }
        let report = self.outbox.flush(&mut self.index, store);
        if !report.is_clean() {
            self.set_status(&format!("{} region(s) failed to save", report.failed.len()));
            self.needs_render = true;
        }
        report
    }

    /// Record a save failure reported outside of [`App::flush`]
    pub fn mark_save_failed(&mut self, id: RegionId) -> bool {
        self.needs_render = true;
        self.index.mark_save_failed(id)
    }

    /// Number of changes whose last write failed, deletes included
    pub fn unsaved_count(&self) -> usize {
        self.index.failed_saves().count() + self.outbox.failed_deletes().len()
    }

    /// Queue every failed region, and every failed delete, to be written
    /// again
    pub fn retry_failed_saves(&mut self) -> usize {
        let failed: Vec<RegionId> = self.index.failed_saves().map(|r| r.id).collect();
        for id in &failed {
            self.outbox.push(PersistOp::Create(*id));
        }
        let deletes = self.outbox.requeue_failed_deletes();
        if !failed.is_empty() || deletes > 0 {
            self.needs_render = true;
        }
        failed.len() + deletes
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Get title for display
    pub fn title(&self) -> String {
        self.exercise
            .as_ref()
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "No exercise".to_string())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
