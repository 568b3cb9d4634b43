use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{Lesson, LessonId, LessonStep, StepId, StepKind, Unit, UnitId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a lesson step before normalization.
///
/// Mirrors the raw row (type tag string + free-form JSON metadata) so
/// adapters stay ignorant of the canonical step union; normalization happens
/// exactly once in [`StepRecord::into_step`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: StepId,
    pub lesson_id: LessonId,
    pub order_index: u32,
    pub kind: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl StepRecord {
    /// Convert the raw record into a canonical `LessonStep`.
    ///
    /// Malformed metadata degrades inside normalization; only a type tag
    /// outside the closed set is an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unknown type tag.
    pub fn into_step(self) -> Result<LessonStep, StorageError> {
        let kind = StepKind::parse(&self.kind)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(LessonStep::normalize(
            self.id,
            self.lesson_id,
            self.order_index,
            kind,
            self.title,
            self.content,
            self.metadata.as_ref(),
        ))
    }
}

/// Durable completion fact for a (user, lesson) pair.
///
/// At most one logical record exists per pair; the store's uniqueness
/// constraint is the only transactional guarantee this system relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub completed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Read-only query surface over course content.
///
/// All listings come back in traversal order: ascending order index, ties
/// broken by ascending id.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Ordered units of the course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn list_units(&self) -> Result<Vec<Unit>, StorageError>;

    /// Ordered lessons of a unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn list_lessons(&self, unit_id: UnitId) -> Result<Vec<Lesson>, StorageError>;

    /// Ordered, normalized steps of a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched or a row
    /// carries a type tag outside the closed set.
    async fn list_steps(&self, lesson_id: LessonId) -> Result<Vec<LessonStep>, StorageError>;
}

/// Durable per-user, per-lesson completion facts.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// The set of lesson ids the user has completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be read.
    async fn completed_lesson_ids(&self, user: UserId) -> Result<HashSet<LessonId>, StorageError>;

    /// Mark a lesson completed for a user, keyed on the (user, lesson) pair.
    ///
    /// Idempotent: re-marking an already-completed pair is a no-op. A
    /// surfaced uniqueness conflict maps to `StorageError::Conflict`, which
    /// callers must treat as success, since the desired end state already
    /// holds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on a uniqueness violation, or other
    /// variants for real write failures.
    async fn upsert_completion(
        &self,
        user: UserId,
        lesson: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    units: Arc<Mutex<Vec<Unit>>>,
    lessons: Arc<Mutex<Vec<Lesson>>>,
    steps: Arc<Mutex<Vec<LessonStep>>>,
    completions: Arc<Mutex<HashMap<(UserId, LessonId), CompletionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit to the in-memory content set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing lock is poisoned.
    pub fn insert_unit(&self, unit: Unit) -> Result<(), StorageError> {
        let mut guard = self
            .units
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(unit);
        Ok(())
    }

    /// Add a lesson to the in-memory content set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing lock is poisoned.
    pub fn insert_lesson(&self, lesson: Lesson) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(lesson);
        Ok(())
    }

    /// Add a step to the in-memory content set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing lock is poisoned.
    pub fn insert_step(&self, step: LessonStep) -> Result<(), StorageError> {
        let mut guard = self
            .steps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(step);
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn list_units(&self) -> Result<Vec<Unit>, StorageError> {
        let guard = self
            .units
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut units = guard.clone();
        units.sort_by_key(Unit::sort_key);
        Ok(units)
    }

    async fn list_lessons(&self, unit_id: UnitId) -> Result<Vec<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut lessons: Vec<Lesson> = guard
            .iter()
            .filter(|lesson| lesson.unit_id() == unit_id)
            .cloned()
            .collect();
        lessons.sort_by_key(Lesson::sort_key);
        Ok(lessons)
    }

    async fn list_steps(&self, lesson_id: LessonId) -> Result<Vec<LessonStep>, StorageError> {
        let guard = self
            .steps
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut steps: Vec<LessonStep> = guard
            .iter()
            .filter(|step| step.lesson_id() == lesson_id)
            .cloned()
            .collect();
        steps.sort_by_key(LessonStep::sort_key);
        Ok(steps)
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn completed_lesson_ids(&self, user: UserId) -> Result<HashSet<LessonId>, StorageError> {
        let guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .values()
            .filter(|record| record.user_id == user && record.completed)
            .map(|record| record.lesson_id)
            .collect())
    }

    async fn upsert_completion(
        &self,
        user: UserId,
        lesson: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .entry((user, lesson))
            .or_insert_with(|| CompletionRecord {
                user_id: user,
                lesson_id: lesson,
                completed: true,
                completed_at,
            });
        Ok(())
    }
}

/// Aggregates the content and progress surfaces behind trait objects for
/// easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub content: Arc<dyn ContentRepository>,
    pub progress: Arc<dyn ProgressStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let content: Arc<dyn ContentRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressStore> = Arc::new(repo);
        Self { content, progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{ReadStep, StepContent};
    use lesson_core::time::fixed_now;

    fn build_unit(id: u64, order_index: u32) -> Unit {
        Unit::new(UnitId::new(id), format!("Unit {id}"), None, order_index).unwrap()
    }

    fn build_lesson(id: u64, unit: u64, order_index: u32) -> Lesson {
        Lesson::new(
            LessonId::new(id),
            UnitId::new(unit),
            format!("Lesson {id}"),
            None,
            order_index,
        )
        .unwrap()
    }

    fn build_step(id: u64, lesson: u64, order_index: u32) -> LessonStep {
        LessonStep::new(
            StepId::new(id),
            LessonId::new(lesson),
            order_index,
            None,
            StepContent::Read(ReadStep {
                body: "text".into(),
                glyph_tag: None,
            }),
        )
    }

    #[tokio::test]
    async fn listings_come_back_in_traversal_order() {
        let repo = InMemoryRepository::new();
        repo.insert_unit(build_unit(2, 1)).unwrap();
        repo.insert_unit(build_unit(1, 0)).unwrap();
        // duplicate order index: id breaks the tie
        repo.insert_lesson(build_lesson(12, 1, 5)).unwrap();
        repo.insert_lesson(build_lesson(11, 1, 5)).unwrap();
        repo.insert_step(build_step(22, 11, 1)).unwrap();
        repo.insert_step(build_step(21, 11, 0)).unwrap();

        let units = repo.list_units().await.unwrap();
        assert_eq!(units[0].id(), UnitId::new(1));

        let lessons = repo.list_lessons(UnitId::new(1)).await.unwrap();
        assert_eq!(lessons[0].id(), LessonId::new(11));
        assert_eq!(lessons[1].id(), LessonId::new(12));

        let steps = repo.list_steps(LessonId::new(11)).await.unwrap();
        assert_eq!(steps[0].id(), StepId::new(21));
    }

    #[tokio::test]
    async fn upsert_completion_is_idempotent() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let lesson = LessonId::new(7);

        repo.upsert_completion(user, lesson, fixed_now())
            .await
            .unwrap();
        repo.upsert_completion(user, lesson, fixed_now())
            .await
            .unwrap();

        let completed = repo.completed_lesson_ids(user).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert!(completed.contains(&lesson));
    }

    #[tokio::test]
    async fn completion_sets_are_scoped_per_user() {
        let repo = InMemoryRepository::new();
        let alice = UserId::random();
        let bob = UserId::random();

        repo.upsert_completion(alice, LessonId::new(1), fixed_now())
            .await
            .unwrap();

        assert!(repo.completed_lesson_ids(bob).await.unwrap().is_empty());
    }

    #[test]
    fn unknown_kind_in_record_is_a_serialization_error() {
        let record = StepRecord {
            id: StepId::new(1),
            lesson_id: LessonId::new(1),
            order_index: 0,
            kind: "video".into(),
            title: None,
            content: None,
            metadata: None,
        };
        assert!(matches!(
            record.into_step(),
            Err(StorageError::Serialization(_))
        ));
    }
}
