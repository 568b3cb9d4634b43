use chrono::{DateTime, Utc};
use std::collections::HashSet;

use lesson_core::model::{LessonId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, lesson_id_from_i64, map_write_err, user_id_to_string};
use crate::repository::{ProgressStore, StorageError};

#[async_trait::async_trait]
impl ProgressStore for SqliteRepository {
    async fn completed_lesson_ids(&self, user: UserId) -> Result<HashSet<LessonId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT lesson_id
            FROM user_progress
            WHERE user_id = ?1 AND is_completed = 1
            ",
        )
        .bind(user_id_to_string(user))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut completed = HashSet::with_capacity(rows.len());
        for row in rows {
            completed.insert(lesson_id_from_i64(
                row.try_get::<i64, _>("lesson_id")
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            )?);
        }
        Ok(completed)
    }

    async fn upsert_completion(
        &self,
        user: UserId,
        lesson: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // The conflict target is the (user_id, lesson_id) primary key; a
        // repeat write lands on DO UPDATE and stays a single logical record.
        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, lesson_id, is_completed, completed_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                is_completed = 1
            ",
        )
        .bind(user_id_to_string(user))
        .bind(id_to_i64("lesson_id", lesson.value())?)
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }
}
