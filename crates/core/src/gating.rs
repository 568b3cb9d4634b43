//! The gating engine: derives a lock/unlock status for each item of an
//! ordered collection from the completion facts of the items before it.
//!
//! Pure functions over supplied data: no I/O, cheap enough to recompute on
//! every read. Callers must pass collections already in traversal order
//! (ascending order index, id tiebreak) and the latest known completion
//! snapshot; status is derived fresh each time and is never stored.

use std::collections::HashSet;
use std::hash::Hash;

/// Derived progression status. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Locked,
    Active,
    Completed,
}

/// Status of the item at `index` within an ordered collection.
///
/// The gate is strictly local: an item's status depends only on its own
/// completion fact and its immediate predecessor's. Rules, in order:
/// completed → `Completed`; first item → `Active`; predecessor completed →
/// `Active`; otherwise `Locked`. An out-of-range index is `Locked`.
#[must_use]
pub fn status_at<I>(index: usize, ordered: &[I], completed: &HashSet<I>) -> Status
where
    I: Copy + Eq + Hash,
{
    let Some(id) = ordered.get(index) else {
        return Status::Locked;
    };
    if completed.contains(id) {
        return Status::Completed;
    }
    if index == 0 {
        return Status::Active;
    }
    if completed.contains(&ordered[index - 1]) {
        return Status::Active;
    }
    Status::Locked
}

/// Statuses for every item of an ordered collection.
///
/// An empty collection yields an empty vector; there is no error case.
#[must_use]
pub fn statuses<I>(ordered: &[I], completed: &HashSet<I>) -> Vec<Status>
where
    I: Copy + Eq + Hash,
{
    (0..ordered.len())
        .map(|index| status_at(index, ordered, completed))
        .collect()
}

/// Units whose lesson list is non-empty and fully completed.
///
/// This is the unit-level completion rollup: unit statuses are computed by
/// feeding the returned set into the same single-predecessor gate used for
/// lessons. A unit with no lessons is never considered completed.
#[must_use]
pub fn completed_units<U, L>(
    units: &[(U, Vec<L>)],
    completed_lessons: &HashSet<L>,
) -> HashSet<U>
where
    U: Copy + Eq + Hash,
    L: Copy + Eq + Hash,
{
    units
        .iter()
        .filter(|(_, lessons)| {
            !lessons.is_empty()
                && lessons
                    .iter()
                    .all(|lesson| completed_lessons.contains(lesson))
        })
        .map(|(unit, _)| *unit)
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
