use std::fmt;

use lesson_core::model::QuizStep;

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Feedback shown to the learner after a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizFeedback {
    Correct,
    TryAgain,
    /// The question has no resolvable correct option.
    Unconfigured,
}

impl fmt::Display for QuizFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizFeedback::Correct => f.write_str("Correct!"),
            QuizFeedback::TryAgain => f.write_str("Incorrect. Try again."),
            QuizFeedback::Unconfigured => f.write_str("This question is not configured."),
        }
    }
}

//
// ─── QUIZ BOARD ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizPhase {
    Unanswered,
    Correct,
    Incorrect,
}

/// Interaction state for the quiz step currently displayed.
///
/// Rebuilt whenever the runner changes steps. An incorrect selection never
/// locks the question: the learner retries until correct, and the first
/// correct answer is sticky for the remainder of the visit.
#[derive(Debug, Clone)]
pub struct QuizBoard {
    correct_option_id: Option<String>,
    selected_option_id: Option<String>,
    phase: QuizPhase,
    feedback: Option<QuizFeedback>,
}

impl QuizBoard {
    #[must_use]
    pub fn new(step: &QuizStep) -> Self {
        Self {
            correct_option_id: step.correct_option_id.clone(),
            selected_option_id: None,
            phase: QuizPhase::Unanswered,
            feedback: None,
        }
    }

    /// Select an option by id.
    ///
    /// Ignored once the question has been answered correctly. A question
    /// with no resolvable correct option answers incorrect with the
    /// distinct unconfigured feedback.
    pub fn select(&mut self, option_id: &str) {
        if self.phase == QuizPhase::Correct {
            return;
        }

        let Some(correct) = self.correct_option_id.as_deref() else {
            self.selected_option_id = Some(option_id.to_string());
            self.phase = QuizPhase::Incorrect;
            self.feedback = Some(QuizFeedback::Unconfigured);
            return;
        };

        let is_correct = option_id == correct;
        self.selected_option_id = Some(option_id.to_string());
        if is_correct {
            self.phase = QuizPhase::Correct;
            self.feedback = Some(QuizFeedback::Correct);
        } else {
            self.phase = QuizPhase::Incorrect;
            self.feedback = Some(QuizFeedback::TryAgain);
        }
    }

    /// True once the question has been answered correctly.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.phase == QuizPhase::Correct
    }

    /// True if any answer has been given yet.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.phase != QuizPhase::Unanswered
    }

    #[must_use]
    pub fn selected_option_id(&self) -> Option<&str> {
        self.selected_option_id.as_deref()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<QuizFeedback> {
        self.feedback
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::QuizOption;

    fn two_option_quiz(correct: Option<&str>) -> QuizStep {
        QuizStep {
            question: "Pick one".into(),
            options: vec![
                QuizOption {
                    id: "a".into(),
                    text: "X".into(),
                },
                QuizOption {
                    id: "b".into(),
                    text: "Y".into(),
                },
            ],
            correct_option_id: correct.map(str::to_string),
            explanation: None,
        }
    }

    #[test]
    fn wrong_then_right_selection() {
        let mut board = QuizBoard::new(&two_option_quiz(Some("b")));

        board.select("a");
        assert!(!board.is_correct());
        assert_eq!(board.feedback(), Some(QuizFeedback::TryAgain));
        assert_eq!(board.selected_option_id(), Some("a"));

        board.select("b");
        assert!(board.is_correct());
        assert_eq!(board.feedback(), Some(QuizFeedback::Correct));
    }

    #[test]
    fn first_correct_answer_is_sticky() {
        let mut board = QuizBoard::new(&two_option_quiz(Some("b")));
        board.select("b");
        assert!(board.is_correct());

        // later selections change nothing
        board.select("a");
        assert!(board.is_correct());
        assert_eq!(board.selected_option_id(), Some("b"));
        assert_eq!(board.feedback(), Some(QuizFeedback::Correct));
    }

    #[test]
    fn same_wrong_option_may_be_retried() {
        let mut board = QuizBoard::new(&two_option_quiz(Some("b")));
        board.select("a");
        board.select("a");
        assert!(!board.is_correct());
        assert_eq!(board.feedback(), Some(QuizFeedback::TryAgain));
    }

    #[test]
    fn unconfigured_question_reports_distinct_feedback() {
        let mut board = QuizBoard::new(&two_option_quiz(None));
        board.select("a");
        assert!(!board.is_correct());
        assert!(board.is_answered());
        assert_eq!(board.feedback(), Some(QuizFeedback::Unconfigured));
    }
}
