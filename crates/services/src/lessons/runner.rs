use std::fmt;

use lesson_core::model::{LessonId, LessonStep, StepContent, StepKind};

use super::progress::LessonProgress;
use super::workflow::UnitContext;
use crate::error::PlaybackError;
use crate::steps::{AudioPlayback, AudioTransport, FlipBoard, QuizBoard, TransportStatus};

/// Drives traversal through a lesson's ordered steps.
///
/// Purely in-memory: loading and completion persistence live in
/// `LessonLoopService`. The step list is immutable for the session, the
/// model is strictly forward, and the interaction state for the current
/// step is reset on every index change.
pub struct StepRunner {
    lesson_id: LessonId,
    unit: UnitContext,
    steps: Vec<LessonStep>,
    current: usize,
    quiz: Option<QuizBoard>,
    flips: FlipBoard,
    audio: AudioPlayback,
}

impl StepRunner {
    /// Build a runner over an ordered step list, positioned at the first
    /// step with all interaction state cleared.
    #[must_use]
    pub fn new(lesson_id: LessonId, unit: UnitContext, steps: Vec<LessonStep>) -> Self {
        let mut runner = Self {
            lesson_id,
            unit,
            steps,
            current: 0,
            quiz: None,
            flips: FlipBoard::new(),
            audio: AudioPlayback::new(),
        };
        runner.rebuild_interaction();
        runner
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn unit(&self) -> &UnitContext {
        &self.unit
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&LessonStep> {
        self.steps.get(self.current)
    }

    /// True when the lesson has no steps at all, a distinct display state;
    /// an empty lesson can never be finished.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True once the completion sequence has run and the index moved past
    /// the final step.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.steps.is_empty() && self.current >= self.steps.len()
    }

    #[must_use]
    pub(crate) fn on_last_step(&self) -> bool {
        !self.steps.is_empty() && self.current == self.steps.len() - 1
    }

    /// The sole gate on forward progress.
    ///
    /// Quiz steps require an answered-correct interaction state; read,
    /// flashcard and audio steps advance unconditionally. A finished or
    /// empty lesson cannot advance.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        let Some(step) = self.current_step() else {
            return false;
        };
        match step.kind() {
            StepKind::Quiz => self.quiz.as_ref().is_some_and(QuizBoard::is_correct),
            StepKind::Read | StepKind::Flashcard | StepKind::Audio => true,
        }
    }

    #[must_use]
    pub fn progress(&self) -> LessonProgress {
        let total = self.steps.len();
        LessonProgress {
            total,
            position: (self.current + 1).min(total),
            is_finished: self.is_finished(),
        }
    }

    // ─── quiz ──────────────────────────────────────────────────────────────

    /// Interaction state of the current quiz step, if the current step is a
    /// quiz.
    #[must_use]
    pub fn quiz(&self) -> Option<&QuizBoard> {
        self.quiz.as_ref()
    }

    /// Forward a selection to the current quiz step. Ignored on any other
    /// step type.
    pub fn select_option(&mut self, option_id: &str) {
        if let Some(board) = self.quiz.as_mut() {
            board.select(option_id);
        }
    }

    // ─── flashcard ─────────────────────────────────────────────────────────

    /// Toggle the current flashcard and return its new face-up state.
    /// Returns `false` unchanged on any other step type.
    pub fn toggle_card(&mut self) -> bool {
        let Some(step) = self.steps.get(self.current) else {
            return false;
        };
        if step.kind() != StepKind::Flashcard {
            return false;
        }
        self.flips.toggle(step.id())
    }

    #[must_use]
    pub fn is_card_flipped(&self) -> bool {
        self.current_step()
            .is_some_and(|step| self.flips.is_flipped(step.id()))
    }

    #[must_use]
    pub fn flips(&self) -> &FlipBoard {
        &self.flips
    }

    // ─── audio ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn audio(&self) -> &AudioPlayback {
        &self.audio
    }

    /// Start or resume playback for the current audio step. A no-op on any
    /// other step type.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError` if the step has no locator or the transport
    /// fails; the error is inline feedback and does not affect progression.
    pub async fn play_audio(
        &mut self,
        transport: &dyn AudioTransport,
    ) -> Result<(), PlaybackError> {
        let spec = match self.steps.get(self.current).map(LessonStep::content) {
            Some(StepContent::Audio(audio)) => audio.clone(),
            _ => return Ok(()),
        };
        self.audio.play(&spec, transport).await
    }

    /// Pause the current playback in place.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Transport` on transport failure.
    pub async fn pause_audio(&mut self) -> Result<(), PlaybackError> {
        self.audio.pause().await
    }

    /// Feed a transport progress report into the playback machine.
    pub fn apply_audio_status(&mut self, status: TransportStatus) {
        self.audio.apply_status(status);
    }

    pub(crate) async fn stop_audio(&mut self) {
        self.audio.stop().await;
    }

    // ─── stepping ──────────────────────────────────────────────────────────

    /// Move to the next step and reset interaction state for it. The caller
    /// must have stopped audio and checked `can_advance` first.
    pub(crate) fn step_forward(&mut self) {
        self.current += 1;
        self.rebuild_interaction();
    }

    /// Enter the finished display state. Reached only through the
    /// completion sequence.
    pub(crate) fn finish(&mut self) {
        self.current = self.steps.len();
        self.quiz = None;
    }

    fn rebuild_interaction(&mut self) {
        self.quiz = match self.steps.get(self.current).map(LessonStep::content) {
            Some(StepContent::Quiz(quiz)) => Some(QuizBoard::new(quiz)),
            _ => None,
        };
    }
}

impl fmt::Debug for StepRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRunner")
            .field("lesson_id", &self.lesson_id)
            .field("steps_len", &self.steps.len())
            .field("current", &self.current)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
