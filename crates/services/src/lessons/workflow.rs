use std::sync::Arc;

use chrono::{DateTime, Utc};

use lesson_core::Clock;
use lesson_core::model::{LessonId, UnitId};
use storage::repository::{ContentRepository, ProgressStore, StorageError};

use super::runner::StepRunner;
use crate::auth::AuthProvider;
use crate::error::{CompletionError, LoadError, PlaybackError};
use crate::steps::AudioTransport;

/// Parent-unit info carried into the finished presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitContext {
    Unit { id: UnitId, title: String },
    /// Sentinel for a lesson opened without unit context.
    Unknown,
}

/// Signal that the lesson-finished transition should occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonFinished {
    pub lesson_id: LessonId,
    pub unit: UnitContext,
    pub finished_at: DateTime<Utc>,
    /// False when the completion write failed for a non-conflict reason and
    /// was deliberately not allowed to block the learner. The next
    /// successful write self-heals; gating re-derives status from whatever
    /// facts exist.
    pub progress_saved: bool,
}

/// Result of a single advance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The advance gate was not satisfied (or the lesson is already
    /// finished); nothing changed.
    Blocked,
    /// Moved to the next step.
    Moved,
    /// The final step was completed.
    Finished(LessonFinished),
}

/// Orchestrates lesson loading, advancement, and completion write-back.
#[derive(Clone)]
pub struct LessonLoopService {
    clock: Clock,
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressStore>,
    auth: Arc<dyn AuthProvider>,
    transport: Arc<dyn AudioTransport>,
}

impl LessonLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentRepository>,
        progress: Arc<dyn ProgressStore>,
        auth: Arc<dyn AuthProvider>,
        transport: Arc<dyn AudioTransport>,
    ) -> Self {
        Self {
            clock,
            content,
            progress,
            auth,
            transport,
        }
    }

    /// Load a lesson's ordered steps and hand back a fresh runner.
    ///
    /// The runner starts at the first step with all interaction state
    /// cleared. Retry a failed load by calling this again.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the step listing cannot be fetched.
    pub async fn start(
        &self,
        lesson_id: LessonId,
        unit: UnitContext,
    ) -> Result<StepRunner, LoadError> {
        let steps = self.content.list_steps(lesson_id).await?;
        Ok(StepRunner::new(lesson_id, unit, steps))
    }

    /// Advance the runner one step, or run the completion sequence when it
    /// stands on the final step.
    ///
    /// When the gate is not satisfied this is a no-op reported as
    /// `AdvanceOutcome::Blocked`. In-flight audio is stopped and released
    /// before any index change.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::Identity` if no user identity can be
    /// resolved on the final step; the runner then stays on that step so
    /// the caller can prompt re-auth and retry.
    pub async fn advance(&self, runner: &mut StepRunner) -> Result<AdvanceOutcome, CompletionError> {
        if !runner.can_advance() {
            return Ok(AdvanceOutcome::Blocked);
        }

        runner.stop_audio().await;

        if runner.on_last_step() {
            let finished = self.complete(runner).await?;
            runner.finish();
            return Ok(AdvanceOutcome::Finished(finished));
        }

        runner.step_forward();
        Ok(AdvanceOutcome::Moved)
    }

    /// Start or resume playback for the runner's current audio step.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError` from the step machine; inline feedback only.
    pub async fn play_audio(&self, runner: &mut StepRunner) -> Result<(), PlaybackError> {
        runner.play_audio(self.transport.as_ref()).await
    }

    /// Pause the runner's current playback in place.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Transport` on transport failure.
    pub async fn pause_audio(&self, runner: &mut StepRunner) -> Result<(), PlaybackError> {
        runner.pause_audio().await
    }

    /// Lesson exit: deterministically stop and release lesson-scoped
    /// resources.
    pub async fn close(&self, runner: &mut StepRunner) {
        runner.stop_audio().await;
    }

    /// The completion sequence.
    ///
    /// Identity absence aborts. A uniqueness conflict from the store means
    /// the fact already holds and counts as success. Any other persistence
    /// failure is logged and does not block the finished transition.
    async fn complete(&self, runner: &StepRunner) -> Result<LessonFinished, CompletionError> {
        let Some(user) = self.auth.current_user().await else {
            return Err(CompletionError::Identity);
        };

        let lesson_id = runner.lesson_id();
        let finished_at = self.clock.now();
        let progress_saved = match self
            .progress
            .upsert_completion(user, lesson_id, finished_at)
            .await
        {
            Ok(()) => true,
            Err(StorageError::Conflict) => {
                tracing::debug!(user = %user, lesson = %lesson_id, "completion already recorded");
                true
            }
            Err(err) => {
                tracing::warn!(
                    user = %user,
                    lesson = %lesson_id,
                    error = %err,
                    "completion write failed; not blocking the learner"
                );
                false
            }
        };

        Ok(LessonFinished {
            lesson_id,
            unit: runner.unit().clone(),
            finished_at,
            progress_saved,
        })
    }
}
