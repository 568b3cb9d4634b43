use lesson_core::model::{Lesson, LessonId, LessonStep, Unit, UnitId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_lesson_row, map_step_row, map_unit_row, map_write_err};
use crate::repository::{ContentRepository, StepRecord, StorageError};

#[async_trait::async_trait]
impl ContentRepository for SqliteRepository {
    async fn list_units(&self) -> Result<Vec<Unit>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, order_index
            FROM units
            ORDER BY order_index ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut units = Vec::with_capacity(rows.len());
        for row in rows {
            units.push(map_unit_row(&row)?);
        }
        Ok(units)
    }

    async fn list_lessons(&self, unit_id: UnitId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, unit_id, title, description, order_index
            FROM lessons
            WHERE unit_id = ?1
            ORDER BY order_index ASC, id ASC
            ",
        )
        .bind(id_to_i64("unit_id", unit_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(map_lesson_row(&row)?);
        }
        Ok(lessons)
    }

    async fn list_steps(&self, lesson_id: LessonId) -> Result<Vec<LessonStep>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, lesson_id, order_index, kind, title, content, metadata
            FROM lesson_steps
            WHERE lesson_id = ?1
            ORDER BY order_index ASC, id ASC
            ",
        )
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut steps = Vec::with_capacity(rows.len());
        for row in rows {
            steps.push(map_step_row(&row)?);
        }
        Ok(steps)
    }
}

// Content writes are not part of the query surface; they exist for the seed
// binary and integration tests, on the concrete repository only.
impl SqliteRepository {
    /// Insert or update a unit row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn insert_unit(&self, unit: &Unit) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO units (id, title, description, order_index)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                order_index = excluded.order_index
            ",
        )
        .bind(id_to_i64("unit_id", unit.id().value())?)
        .bind(unit.title())
        .bind(unit.description())
        .bind(i64::from(unit.order_index()))
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    /// Insert or update a lesson row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lessons (id, unit_id, title, description, order_index)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                unit_id = excluded.unit_id,
                title = excluded.title,
                description = excluded.description,
                order_index = excluded.order_index
            ",
        )
        .bind(id_to_i64("lesson_id", lesson.id().value())?)
        .bind(id_to_i64("unit_id", lesson.unit_id().value())?)
        .bind(lesson.title())
        .bind(lesson.description())
        .bind(i64::from(lesson.order_index()))
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    /// Insert or update a raw step row.
    ///
    /// Takes the pre-normalization record so seeded rows round-trip through
    /// the same normalization path real content does.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn insert_step_record(&self, record: &StepRecord) -> Result<(), StorageError> {
        let metadata = record
            .metadata
            .as_ref()
            .map(serde_json::Value::to_string);
        sqlx::query(
            r"
            INSERT INTO lesson_steps (id, lesson_id, order_index, kind, title, content, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                lesson_id = excluded.lesson_id,
                order_index = excluded.order_index,
                kind = excluded.kind,
                title = excluded.title,
                content = excluded.content,
                metadata = excluded.metadata
            ",
        )
        .bind(id_to_i64("step_id", record.id.value())?)
        .bind(id_to_i64("lesson_id", record.lesson_id.value())?)
        .bind(i64::from(record.order_index))
        .bind(record.kind.as_str())
        .bind(record.title.as_deref())
        .bind(record.content.as_deref())
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }
}
