use lesson_core::model::{Lesson, LessonId, LessonStep, StepId, Unit, UnitId, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{StepRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn unit_id_from_i64(v: i64) -> Result<UnitId, StorageError> {
    Ok(UnitId::new(i64_to_u64("unit_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn step_id_from_i64(v: i64) -> Result<StepId, StorageError> {
    Ok(StepId::new(i64_to_u64("step_id", v)?))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_to_string(user: UserId) -> String {
    user.value().to_string()
}

pub(crate) fn map_unit_row(row: &SqliteRow) -> Result<Unit, StorageError> {
    Unit::new(
        unit_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        i64_to_u32("order_index", row.try_get::<i64, _>("order_index").map_err(ser)?)?,
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    Lesson::new(
        lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        unit_id_from_i64(row.try_get::<i64, _>("unit_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        i64_to_u32("order_index", row.try_get::<i64, _>("order_index").map_err(ser)?)?,
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

pub(crate) fn map_step_row(row: &SqliteRow) -> Result<LessonStep, StorageError> {
    // Metadata that is not valid JSON degrades to "no metadata"; only an
    // unknown type tag fails the mapping.
    let metadata = row
        .try_get::<Option<String>, _>("metadata")
        .map_err(ser)?
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok());

    let record = StepRecord {
        id: step_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        order_index: i64_to_u32(
            "order_index",
            row.try_get::<i64, _>("order_index").map_err(ser)?,
        )?,
        kind: row.try_get::<String, _>("kind").map_err(ser)?,
        title: row.try_get::<Option<String>, _>("title").map_err(ser)?,
        content: row.try_get::<Option<String>, _>("content").map_err(ser)?,
        metadata,
    };
    record.into_step()
}

/// Maps a write failure, distinguishing uniqueness conflicts so callers can
/// treat them as already-done.
pub(crate) fn map_write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
    }
    StorageError::Connection(e.to_string())
}
