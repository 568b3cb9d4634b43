use thiserror::Error;

use crate::model::ids::UnitId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnitError {
    #[error("unit title cannot be empty")]
    EmptyTitle,
}

/// Top-level content grouping containing ordered lessons.
///
/// Immutable once fetched; `order_index` (with the id as tiebreak) is the
/// authoritative traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    title: String,
    description: Option<String>,
    order_index: u32,
}

impl Unit {
    /// Creates a new unit.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::EmptyTitle` if the title is empty or whitespace.
    pub fn new(
        id: UnitId,
        title: impl Into<String>,
        description: Option<String>,
        order_index: u32,
    ) -> Result<Self, UnitError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(UnitError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description,
            order_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
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
    ///
    /// Gaps and duplicate indices are tolerated; the id tiebreak keeps the
    /// traversal order deterministic.
    #[must_use]
    pub fn sort_key(&self) -> (u32, u64) {
        (self.order_index, self.id.value())
    }
}
