use std::collections::HashMap;

use lesson_core::model::StepId;

/// Flip state for the flashcards of a single lesson visit.
///
/// Keyed by step id so the state of one card never leaks into another.
/// Cards start face-down; the board lives as long as the runner that owns
/// it, so a lesson (re)load starts every card fresh.
#[derive(Debug, Clone, Default)]
pub struct FlipBoard {
    flipped: HashMap<StepId, bool>,
}

impl FlipBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the card for a step and return its new state.
    pub fn toggle(&mut self, step_id: StepId) -> bool {
        let state = self.flipped.entry(step_id).or_insert(false);
        *state = !*state;
        *state
    }

    #[must_use]
    pub fn is_flipped(&self, step_id: StepId) -> bool {
        self.flipped.get(&step_id).copied().unwrap_or(false)
    }
}
