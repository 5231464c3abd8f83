//! Scored quiz over the regions of an exercise
//!
//! A session samples its tasks up front, then each answer is checked against
//! the current task and the session advances after a fixed delay. Progress is
//! driven by [`QuizSession::tick`], so the owner controls time.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::Timer;
use crate::error::QuizError;
use crate::model::{AudioRef, Region, RegionId};
use crate::region_index::RegionIndex;

/// Which content a region must carry to be asked about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ContentMode {
    TextOnly,
    AudioOnly,
    Either,
}

impl ContentMode {
    pub fn all() -> &'static [ContentMode] {
        &[ContentMode::TextOnly, ContentMode::AudioOnly, ContentMode::Either]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentMode::TextOnly => "text",
            ContentMode::AudioOnly => "audio",
            ContentMode::Either => "text or audio",
        }
    }

    pub fn accepts(&self, region: &Region) -> bool {
        match self {
            ContentMode::TextOnly => region.has_text(),
            ContentMode::AudioOnly => region.has_audio(),
            ContentMode::Either => region.has_text() || region.has_audio(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizTask {
    pub region: RegionId,
}

/// What the quiz UI may show for the current task. Never carries the
/// region's id or label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPrompt {
    /// Zero-based position of the task
    pub index: usize,
    pub total: usize,
    pub correct: usize,
    pub text: Option<String>,
    pub audio: Option<AudioRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    /// `highlight` names the region to blink, absent for empty-space clicks
    Wrong { highlight: Option<RegionId> },
    /// The session was waiting to advance or already finished
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub correct: usize,
    pub wrong: usize,
    pub total: usize,
    pub final_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizProgress {
    Advanced { index: usize },
    Finished(QuizSummary),
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    mode: ContentMode,
    tasks: Vec<QuizTask>,
    current: usize,
    correct: usize,
    wrong: usize,
    advance_delay: Duration,
    advance_timer: Timer,
    finished: bool,
}

impl QuizSession {
    /// Sample `task_count` tasks, with replacement, from the regions
    /// accepted by `mode`
    pub fn start(
        index: &RegionIndex,
        mode: ContentMode,
        task_count: usize,
        advance_delay: Duration,
        rng: &mut impl Rng,
    ) -> Result<Self, QuizError> {
        if task_count == 0 {
            return Err(QuizError::InvalidTaskCount);
        }

        let candidates: Vec<RegionId> = index
            .regions()
            .iter()
            .filter(|r| mode.accepts(r))
            .map(|r| r.id)
            .collect();
        if candidates.is_empty() {
            return Err(QuizError::EmptyCandidateSet(mode.as_str()));
        }

        let tasks = (0..task_count)
            .map(|_| QuizTask {
                region: candidates[rng.gen_range(0..candidates.len())],
            })
            .collect();

        tracing::info!(
            "quiz started: {} tasks over {} {} regions",
            task_count,
            candidates.len(),
            mode.as_str()
        );

        Ok(Self {
            mode,
            tasks,
            current: 0,
            correct: 0,
            wrong: 0,
            advance_delay,
            advance_timer: Timer::idle(),
            finished: false,
        })
    }

    pub fn mode(&self) -> ContentMode {
        self.mode
    }

    pub fn tasks(&self) -> &[QuizTask] {
        &self.tasks
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn wrong_count(&self) -> usize {
        self.wrong
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True between an answer and the move to the next task
    pub fn is_awaiting_advance(&self) -> bool {
        self.advance_timer.is_pending()
    }

    pub fn current_task(&self, index: &RegionIndex) -> Option<TaskPrompt> {
        if self.finished {
            return None;
        }
        let task = self.tasks.get(self.current)?;
        let region = index.get(task.region);

        let text = region.and_then(|r| r.text()).map(str::to_string);
        let audio = region.and_then(|r| r.audio()).cloned();
        let (text, audio) = match self.mode {
            ContentMode::TextOnly => (text, None),
            ContentMode::AudioOnly => (None, audio),
            ContentMode::Either => (text, audio),
        };

        Some(TaskPrompt {
            index: self.current,
            total: self.tasks.len(),
            correct: self.correct,
            text,
            audio,
        })
    }

    pub fn check_answer(&mut self, clicked: Option<RegionId>, now: Duration) -> AnswerOutcome {
        if self.finished || self.advance_timer.is_pending() {
            return AnswerOutcome::Ignored;
        }
        let Some(task) = self.tasks.get(self.current).copied() else {
            return AnswerOutcome::Ignored;
        };

        self.advance_timer.start(now, self.advance_delay);

        match clicked {
            Some(id) if id == task.region => {
                self.correct += 1;
                tracing::debug!("quiz task {} answered correctly", self.current);
                AnswerOutcome::Correct
            }
            Some(_) => {
                self.wrong += 1;
                tracing::debug!("quiz task {} answered wrong", self.current);
                AnswerOutcome::Wrong {
                    highlight: Some(task.region),
                }
            }
            None => {
                self.wrong += 1;
                tracing::debug!("quiz task {} answered on empty space", self.current);
                AnswerOutcome::Wrong { highlight: None }
            }
        }
    }

    pub fn tick(&mut self, now: Duration) -> Option<QuizProgress> {
        self.advance_timer.fire(now)?;

        self.current += 1;
        if self.current < self.tasks.len() {
            return Some(QuizProgress::Advanced {
                index: self.current,
            });
        }

        self.finished = true;
        let summary = self.summary();
        tracing::info!(
            "quiz finished: {}/{} correct, score {}",
            summary.correct,
            summary.total,
            summary.final_score
        );
        Some(QuizProgress::Finished(summary))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.advance_timer.deadline()
    }

    pub fn summary(&self) -> QuizSummary {
        let total = self.tasks.len();
        let final_score = (self.correct as f64 / total as f64 * 100.0).round() as u32;
        QuizSummary {
            correct: self.correct,
            wrong: self.wrong,
            total,
            final_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, RegionPatch};
    use crate::settings::RadiusSettings;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    const DELAY: Duration = Duration::from_millis(1500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn index() -> RegionIndex {
        RegionIndex::new(Uuid::new_v4(), RadiusSettings::default())
    }

    fn add(idx: &mut RegionIndex, x: f64, patch: Option<RegionPatch>) -> RegionId {
        let id = idx.create(Point::new(x, 100.0), 20, None).unwrap().id;
        if let Some(patch) = patch {
            idx.update(id, patch).unwrap();
        }
        id
    }

    /// Answer, then let the advance delay pass
    fn answer(quiz: &mut QuizSession, clicked: Option<RegionId>, now: &mut Duration) -> AnswerOutcome {
        let outcome = quiz.check_answer(clicked, *now);
        *now += DELAY;
        quiz.tick(*now);
        outcome
    }

    #[test]
    fn test_empty_candidate_set() {
        let mut idx = index();
        add(&mut idx, 100.0, Some(RegionPatch::text("only text")));

        let err = QuizSession::start(&idx, ContentMode::AudioOnly, 3, DELAY, &mut rng()).unwrap_err();
        assert!(matches!(err, QuizError::EmptyCandidateSet(_)));
    }

    #[test]
    fn test_zero_tasks_rejected() {
        let mut idx = index();
        add(&mut idx, 100.0, Some(RegionPatch::text("t")));

        let err = QuizSession::start(&idx, ContentMode::TextOnly, 0, DELAY, &mut rng()).unwrap_err();
        assert_eq!(err, QuizError::InvalidTaskCount);
    }

    #[test]
    fn test_either_samples_from_text_regions() {
        let mut idx = index();
        let a = add(&mut idx, 100.0, Some(RegionPatch::text("a")));
        let b = add(&mut idx, 200.0, Some(RegionPatch::text("b")));
        add(&mut idx, 300.0, None);

        let quiz = QuizSession::start(&idx, ContentMode::Either, 5, DELAY, &mut rng()).unwrap();
        assert_eq!(quiz.tasks().len(), 5);
        assert!(quiz.tasks().iter().all(|t| t.region == a || t.region == b));
    }

    #[test]
    fn test_all_correct_scores_100() {
        let mut idx = index();
        let r = add(&mut idx, 100.0, Some(RegionPatch::text("R")));
        let mut quiz = QuizSession::start(&idx, ContentMode::TextOnly, 3, DELAY, &mut rng()).unwrap();
        assert!(quiz.tasks().iter().all(|t| t.region == r));

        let mut now = Duration::ZERO;
        for _ in 0..3 {
            assert_eq!(answer(&mut quiz, Some(r), &mut now), AnswerOutcome::Correct);
        }

        assert!(quiz.is_finished());
        assert_eq!(quiz.correct_count(), 3);
        assert_eq!(quiz.summary().final_score, 100);
    }

    #[test]
    fn test_empty_click_is_wrong_without_highlight() {
        let mut idx = index();
        let r = add(&mut idx, 100.0, Some(RegionPatch::text("R")));
        let mut quiz = QuizSession::start(&idx, ContentMode::TextOnly, 3, DELAY, &mut rng()).unwrap();

        let mut now = Duration::ZERO;
        assert_eq!(
            answer(&mut quiz, None, &mut now),
            AnswerOutcome::Wrong { highlight: None }
        );
        assert_eq!(quiz.wrong_count(), 1);
        answer(&mut quiz, Some(r), &mut now);
        answer(&mut quiz, Some(r), &mut now);

        let summary = quiz.summary();
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.wrong, 1);
        assert_eq!(summary.final_score, 67);
    }

    #[test]
    fn test_wrong_region_highlights_correct_one() {
        let mut idx = index();
        let a = add(&mut idx, 100.0, Some(RegionPatch::text("a")));
        let b = add(&mut idx, 200.0, None);
        let mut quiz = QuizSession::start(&idx, ContentMode::TextOnly, 1, DELAY, &mut rng()).unwrap();

        assert_eq!(
            quiz.check_answer(Some(b), ms(0)),
            AnswerOutcome::Wrong { highlight: Some(a) }
        );
    }

    #[test]
    fn test_advance_waits_for_delay() {
        let mut idx = index();
        let r = add(&mut idx, 100.0, Some(RegionPatch::text("R")));
        let mut quiz = QuizSession::start(&idx, ContentMode::TextOnly, 2, DELAY, &mut rng()).unwrap();

        quiz.check_answer(Some(r), ms(100));
        assert_eq!(quiz.check_answer(Some(r), ms(200)), AnswerOutcome::Ignored);
        assert_eq!(quiz.tick(ms(1599)), None);
        assert_eq!(quiz.current_index(), 0);

        assert_eq!(quiz.tick(ms(1600)), Some(QuizProgress::Advanced { index: 1 }));
        assert_eq!(quiz.correct_count(), 1);

        quiz.check_answer(Some(r), ms(2000));
        match quiz.tick(ms(3500)) {
            Some(QuizProgress::Finished(summary)) => assert_eq!(summary.final_score, 100),
            other => panic!("expected finish, got {other:?}"),
        }
        assert_eq!(quiz.check_answer(Some(r), ms(4000)), AnswerOutcome::Ignored);
        assert!(quiz.current_task(&idx).is_none());
    }

    #[test]
    fn test_prompt_hides_identity_and_filters_content() {
        let mut idx = index();
        let patch = RegionPatch {
            text: Some("Heart".to_string()),
            audio: Some(Some(AudioRef::new("heart.ogg"))),
            ..RegionPatch::default()
        };
        add(&mut idx, 100.0, Some(patch));

        let quiz = QuizSession::start(&idx, ContentMode::TextOnly, 1, DELAY, &mut rng()).unwrap();
        let prompt = quiz.current_task(&idx).unwrap();
        assert_eq!(prompt.text.as_deref(), Some("Heart"));
        assert_eq!(prompt.audio, None);
        assert_eq!((prompt.index, prompt.total, prompt.correct), (0, 1, 0));

        let quiz = QuizSession::start(&idx, ContentMode::Either, 1, DELAY, &mut rng()).unwrap();
        let prompt = quiz.current_task(&idx).unwrap();
        assert!(prompt.text.is_some());
        assert!(prompt.audio.is_some());
    }

    #[test]
    fn test_either_falls_back_to_present_content() {
        let mut idx = index();
        add(&mut idx, 100.0, Some(RegionPatch::audio(AudioRef::new("clip"))));

        let quiz = QuizSession::start(&idx, ContentMode::Either, 1, DELAY, &mut rng()).unwrap();
        let prompt = quiz.current_task(&idx).unwrap();
        assert_eq!(prompt.text, None);
        assert_eq!(prompt.audio, Some(AudioRef::new("clip")));
    }
}
