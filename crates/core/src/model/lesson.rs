use thiserror::Error;

use crate::model::ids::{LessonId, UnitId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,
}

/// An ordered sequence of steps within a unit.
///
/// Ordering contract matches `Unit`: ascending `order_index`, scoped within
/// the parent unit, ties broken by ascending id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    unit_id: UnitId,
    title: String,
    description: Option<String>,
    order_index: u32,
}

impl Lesson {
    /// Creates a new lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or whitespace.
    pub fn new(
        id: LessonId,
        unit_id: UnitId,
        title: impl Into<String>,
        description: Option<String>,
        order_index: u32,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        Ok(Self {
            id,
            unit_id,
            title,
            description,
            order_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    /// Ordering key: ascending order index, ties broken by ascending id.
    #[must_use]
    pub fn sort_key(&self) -> (u32, u64) {
        (self.order_index, self.id.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_rejected() {
        let err = Lesson::new(LessonId::new(1), UnitId::new(1), "", None, 0).unwrap_err();
        assert_eq!(err, LessonError::EmptyTitle);
    }

    #[test]
    fn sort_key_orders_by_index_then_id() {
        let first = Lesson::new(LessonId::new(9), UnitId::new(1), "L1", None, 0).unwrap();
        let second = Lesson::new(LessonId::new(1), UnitId::new(1), "L2", None, 1).unwrap();
        assert!(first.sort_key() < second.sort_key());
    }
}
