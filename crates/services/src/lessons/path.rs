use std::collections::HashSet;
use std::sync::Arc;

use lesson_core::gating::{self, Status};
use lesson_core::model::{Lesson, LessonId, Unit, UnitId, UserId};
use storage::repository::{ContentRepository, ProgressStore};

use crate::error::LoadError;

/// A unit row of the course path, with per-unit progress totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPathItem {
    pub unit: Unit,
    pub status: Status,
    pub total_lessons: usize,
    pub completed_lessons: usize,
}

impl UnitPathItem {
    /// Whole-percent completion for the unit header, 0 for an empty unit.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn completion_percent(&self) -> u8 {
        if self.total_lessons == 0 {
            return 0;
        }
        ((self.completed_lessons as f64 / self.total_lessons as f64) * 100.0).round() as u8
    }
}

/// A lesson row of a unit's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPathItem {
    pub lesson: Lesson,
    pub status: Status,
}

/// Storage-backed status queries for the home and unit views.
///
/// Statuses are derived fresh on every call from the latest completion
/// snapshot; nothing here is cached, so callers navigating back after a
/// completion see the new state by simply calling again.
#[derive(Clone)]
pub struct PathService {
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressStore>,
}

impl PathService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentRepository>, progress: Arc<dyn ProgressStore>) -> Self {
        Self { content, progress }
    }

    /// Ordered units with per-unit lesson totals and derived status.
    ///
    /// Unit statuses come from the completion rollup: a unit counts as
    /// completed once every one of its (non-zero) lessons is completed, and
    /// the rolled-up set feeds the same single-predecessor gate used for
    /// lessons.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if any content listing cannot be fetched.
    pub async fn unit_path(&self, user: UserId) -> Result<Vec<UnitPathItem>, LoadError> {
        let units = self.content.list_units().await?;
        let completed = self.completion_snapshot(user).await;

        let mut lesson_sets: Vec<(UnitId, Vec<LessonId>)> = Vec::with_capacity(units.len());
        for unit in &units {
            let lessons = self.content.list_lessons(unit.id()).await?;
            lesson_sets.push((unit.id(), lessons.iter().map(Lesson::id).collect()));
        }

        let unit_order: Vec<UnitId> = units.iter().map(Unit::id).collect();
        let completed_units = gating::completed_units(&lesson_sets, &completed);
        let statuses = gating::statuses(&unit_order, &completed_units);

        Ok(units
            .into_iter()
            .zip(statuses)
            .zip(lesson_sets)
            .map(|((unit, status), (_, lesson_ids))| {
                let completed_lessons = lesson_ids
                    .iter()
                    .filter(|id| completed.contains(id))
                    .count();
                UnitPathItem {
                    unit,
                    status,
                    total_lessons: lesson_ids.len(),
                    completed_lessons,
                }
            })
            .collect())
    }

    /// Ordered lessons of a unit with derived status.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the lesson listing cannot be fetched.
    pub async fn lesson_path(
        &self,
        user: UserId,
        unit_id: UnitId,
    ) -> Result<Vec<LessonPathItem>, LoadError> {
        let lessons = self.content.list_lessons(unit_id).await?;
        let completed = self.completion_snapshot(user).await;

        let order: Vec<LessonId> = lessons.iter().map(Lesson::id).collect();
        let statuses = gating::statuses(&order, &completed);

        Ok(lessons
            .into_iter()
            .zip(statuses)
            .map(|(lesson, status)| LessonPathItem { lesson, status })
            .collect())
    }

    /// Latest completion snapshot for the user.
    ///
    /// A failed read degrades to the empty set (the path renders fresh
    /// rather than erroring) and the failure is logged so it stays
    /// observable.
    async fn completion_snapshot(&self, user: UserId) -> HashSet<LessonId> {
        match self.progress.completed_lesson_ids(user).await {
            Ok(completed) => completed,
            Err(err) => {
                tracing::warn!(
                    user = %user,
                    error = %err,
                    "completed-lesson read failed; treating as none completed"
                );
                HashSet::new()
            }
        }
    }
}
