use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{LessonId, StepId};
use crate::model::media::MediaUri;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    #[error("unknown step type tag: {kind}")]
    UnknownKind { kind: String },
}

//
// ─── STEP KIND ─────────────────────────────────────────────────────────────────
//

/// Closed set of step type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Read,
    Quiz,
    Flashcard,
    Audio,
}

impl StepKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Read => "read",
            StepKind::Quiz => "quiz",
            StepKind::Flashcard => "flashcard",
            StepKind::Audio => "audio",
        }
    }

    /// Parse a stored type tag.
    ///
    /// # Errors
    ///
    /// Returns `StepError::UnknownKind` for tags outside the closed set.
    pub fn parse(kind: &str) -> Result<Self, StepError> {
        match kind {
            "read" => Ok(StepKind::Read),
            "quiz" => Ok(StepKind::Quiz),
            "flashcard" => Ok(StepKind::Flashcard),
            "audio" => Ok(StepKind::Audio),
            other => Err(StepError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── CANONICAL STEP CONTENT ────────────────────────────────────────────────────
//

/// A single quiz answer option in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
}

/// Prose step. The body may carry markdown; an optional illustrative tag is
/// resolved to a decorative glyph by `crate::glyph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStep {
    pub body: String,
    pub glyph_tag: Option<String>,
}

impl ReadStep {
    /// Decorative glyph for this step, if an illustrative tag is present.
    #[must_use]
    pub fn glyph(&self) -> Option<&'static str> {
        crate::glyph::resolve(self.glyph_tag.as_deref())
    }
}

/// Single-choice question. `correct_option_id == None` means the question is
/// unanswerable ("unconfigured"); selection then yields a distinct feedback
/// state rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStep {
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct_option_id: Option<String>,
    pub explanation: Option<String>,
}

/// Two-sided vocabulary card. Starts face-down (front shown).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardStep {
    pub front: String,
    pub back: String,
}

/// Listening step. A missing locator is not a load error; it surfaces as a
/// playback error when play is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStep {
    pub locator: Option<MediaUri>,
    pub description: Option<String>,
}

/// Type-specific payload of a lesson step, one variant per tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepContent {
    Read(ReadStep),
    Quiz(QuizStep),
    Flashcard(FlashcardStep),
    Audio(AudioStep),
}

impl StepContent {
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            StepContent::Read(_) => StepKind::Read,
            StepContent::Quiz(_) => StepKind::Quiz,
            StepContent::Flashcard(_) => StepKind::Flashcard,
            StepContent::Audio(_) => StepKind::Audio,
        }
    }
}

/// A single interactive unit of lesson content.
///
/// Built through [`LessonStep::normalize`], which folds the raw persisted
/// shape (type tag + free-form metadata, including legacy field spellings)
/// into the canonical tagged union exactly once. Business logic never
/// branches on raw metadata shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonStep {
    id: StepId,
    lesson_id: LessonId,
    order_index: u32,
    title: Option<String>,
    content: StepContent,
}

impl LessonStep {
    /// Assemble a step from already-canonical content.
    #[must_use]
    pub fn new(
        id: StepId,
        lesson_id: LessonId,
        order_index: u32,
        title: Option<String>,
        content: StepContent,
    ) -> Self {
        Self {
            id,
            lesson_id,
            order_index,
            title,
            content,
        }
    }

    /// Normalize a raw persisted step into canonical form.
    ///
    /// `primary` is the step's primary content string; `metadata` is the raw
    /// JSON payload, if any. Malformed metadata degrades to the empty shape
    /// for the step's kind; normalization never fails for bad payloads.
    #[must_use]
    pub fn normalize(
        id: StepId,
        lesson_id: LessonId,
        order_index: u32,
        kind: StepKind,
        title: Option<String>,
        primary: Option<String>,
        metadata: Option<&serde_json::Value>,
    ) -> Self {
        let meta = metadata
            .and_then(|value| serde_json::from_value::<RawMetadata>(value.clone()).ok())
            .unwrap_or_default();

        let content = match kind {
            StepKind::Read => StepContent::Read(normalize_read(primary, meta)),
            StepKind::Quiz => StepContent::Quiz(normalize_quiz(primary, meta)),
            StepKind::Flashcard => StepContent::Flashcard(normalize_flashcard(primary, meta)),
            StepKind::Audio => StepContent::Audio(normalize_audio(meta)),
        };

        Self {
            id,
            lesson_id,
            order_index,
            title,
            content,
        }
    }

    #[must_use]
    pub fn id(&self) -> StepId {
        self.id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &StepContent {
        &self.content
    }

    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.content.kind()
    }

    /// Ordering key: ascending order index, ties broken by ascending id.
    #[must_use]
    pub fn sort_key(&self) -> (u32, u64) {
        (self.order_index, self.id.value())
    }
}

//
// ─── RAW METADATA (wire shapes) ────────────────────────────────────────────────
//

/// Raw metadata payload as persisted, covering current and legacy spellings.
///
/// All fields optional; unknown fields are ignored. Deserialized leniently:
/// a payload that fails to parse as a whole is treated as absent.
#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    // quiz
    question: Option<String>,
    options: Option<RawOptions>,
    #[serde(rename = "correctAnswer")]
    correct_answer: Option<RawCorrectAnswer>,
    correct_option_id: Option<String>,
    explanation: Option<String>,
    // flashcard
    front_text: Option<String>,
    back_text: Option<String>,
    back: Option<String>,
    // audio
    audio_url: Option<String>,
    #[serde(rename = "audioUrl")]
    audio_url_legacy: Option<String>,
    // read / audio description
    text: Option<String>,
    body: Option<String>,
    image_keyword: Option<String>,
}

/// Options arrive either in canonical `{id, text}` form or as bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOptions {
    Canonical(Vec<QuizOption>),
    Bare(Vec<String>),
}

/// Legacy correct-answer field: a positional index or an option id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCorrectAnswer {
    Index(u64),
    Id(String),
}

/// Stored bodies escape newlines as the two-character sequence `\n`.
fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

fn normalize_read(primary: Option<String>, meta: RawMetadata) -> ReadStep {
    let body = primary
        .or(meta.text)
        .or(meta.body)
        .unwrap_or_default();
    ReadStep {
        body: unescape_newlines(&body),
        glyph_tag: meta.image_keyword,
    }
}

fn normalize_quiz(primary: Option<String>, meta: RawMetadata) -> QuizStep {
    let options: Vec<QuizOption> = match meta.options {
        Some(RawOptions::Canonical(options)) => options,
        Some(RawOptions::Bare(texts)) => texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| QuizOption {
                id: format!("opt-{index}"),
                text,
            })
            .collect(),
        None => Vec::new(),
    };

    // Precedence: canonical correct_option_id, then a legacy string id, then
    // a legacy positional index resolved against the normalized options.
    let correct_option_id = meta.correct_option_id.or_else(|| match meta.correct_answer {
        Some(RawCorrectAnswer::Id(id)) => Some(id),
        Some(RawCorrectAnswer::Index(index)) => usize::try_from(index)
            .ok()
            .and_then(|i| options.get(i))
            .map(|option| option.id.clone()),
        None => None,
    });

    QuizStep {
        question: meta.question.or(primary).unwrap_or_default(),
        options,
        correct_option_id,
        explanation: meta.explanation,
    }
}

fn normalize_flashcard(primary: Option<String>, meta: RawMetadata) -> FlashcardStep {
    FlashcardStep {
        front: meta.front_text.or(primary).unwrap_or_default(),
        back: meta.back_text.or(meta.back).unwrap_or_default(),
    }
}

fn normalize_audio(meta: RawMetadata) -> AudioStep {
    AudioStep {
        locator: meta
            .audio_url
            .or(meta.audio_url_legacy)
            .and_then(|raw| MediaUri::parse(&raw)),
        description: meta
            .text
            .or(meta.body)
            .map(|raw| unescape_newlines(&raw)),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(kind: StepKind, primary: Option<&str>, metadata: serde_json::Value) -> LessonStep {
        LessonStep::normalize(
            StepId::new(1),
            LessonId::new(1),
            0,
            kind,
            None,
            primary.map(str::to_string),
            Some(&metadata),
        )
    }

    #[test]
    fn quiz_canonical_metadata_passes_through() {
        let step = normalize(
            StepKind::Quiz,
            None,
            json!({
                "question": "Pick one",
                "options": [{"id": "a", "text": "X"}, {"id": "b", "text": "Y"}],
                "correct_option_id": "b",
            }),
        );
        let StepContent::Quiz(quiz) = step.content() else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.question, "Pick one");
        assert_eq!(quiz.options.len(), 2);
        assert_eq!(quiz.correct_option_id.as_deref(), Some("b"));
    }

    #[test]
    fn quiz_bare_options_get_synthetic_ids() {
        let step = normalize(
            StepKind::Quiz,
            Some("Q?"),
            json!({"options": ["first", "second"], "correctAnswer": 1}),
        );
        let StepContent::Quiz(quiz) = step.content() else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.question, "Q?");
        assert_eq!(quiz.options[0].id, "opt-0");
        assert_eq!(quiz.options[1].id, "opt-1");
        assert_eq!(quiz.correct_option_id.as_deref(), Some("opt-1"));
    }

    #[test]
    fn quiz_string_correct_answer_is_accepted_as_id() {
        let step = normalize(
            StepKind::Quiz,
            None,
            json!({
                "options": [{"id": "a", "text": "X"}],
                "correctAnswer": "a",
            }),
        );
        let StepContent::Quiz(quiz) = step.content() else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.correct_option_id.as_deref(), Some("a"));
    }

    #[test]
    fn quiz_out_of_range_index_is_unanswerable() {
        let step = normalize(
            StepKind::Quiz,
            None,
            json!({"options": ["only"], "correctAnswer": 7}),
        );
        let StepContent::Quiz(quiz) = step.content() else {
            panic!("expected quiz");
        };
        assert!(quiz.correct_option_id.is_none());
    }

    #[test]
    fn quiz_malformed_metadata_degrades_to_empty() {
        let step = normalize(StepKind::Quiz, Some("Q?"), json!({"options": 42}));
        let StepContent::Quiz(quiz) = step.content() else {
            panic!("expected quiz");
        };
        assert_eq!(quiz.question, "Q?");
        assert!(quiz.options.is_empty());
        assert!(quiz.correct_option_id.is_none());
    }

    #[test]
    fn read_body_prefers_primary_content() {
        let step = normalize(
            StepKind::Read,
            Some("Line one\\nLine two"),
            json!({"text": "fallback", "image_keyword": "money"}),
        );
        let StepContent::Read(read) = step.content() else {
            panic!("expected read");
        };
        assert_eq!(read.body, "Line one\nLine two");
        assert_eq!(read.glyph_tag.as_deref(), Some("money"));
        assert_eq!(read.glyph(), Some("💰"));
    }

    #[test]
    fn read_falls_back_to_metadata_body() {
        let step = normalize(StepKind::Read, None, json!({"body": "from metadata"}));
        let StepContent::Read(read) = step.content() else {
            panic!("expected read");
        };
        assert_eq!(read.body, "from metadata");
        assert!(read.glyph_tag.is_none());
    }

    #[test]
    fn flashcard_legacy_back_field_is_honored() {
        let step = normalize(
            StepKind::Flashcard,
            Some("front word"),
            json!({"back": "legacy back"}),
        );
        let StepContent::Flashcard(card) = step.content() else {
            panic!("expected flashcard");
        };
        assert_eq!(card.front, "front word");
        assert_eq!(card.back, "legacy back");
    }

    #[test]
    fn audio_accepts_both_locator_spellings() {
        let current = normalize(
            StepKind::Audio,
            None,
            json!({"audio_url": "https://cdn.example.com/a.mp3"}),
        );
        let legacy = normalize(
            StepKind::Audio,
            None,
            json!({"audioUrl": "https://cdn.example.com/b.mp3"}),
        );
        for step in [current, legacy] {
            let StepContent::Audio(audio) = step.content() else {
                panic!("expected audio");
            };
            assert!(audio.locator.is_some());
        }
    }

    #[test]
    fn audio_without_locator_normalizes_to_none() {
        let step = normalize(StepKind::Audio, None, json!({"text": "listen up"}));
        let StepContent::Audio(audio) = step.content() else {
            panic!("expected audio");
        };
        assert!(audio.locator.is_none());
        assert_eq!(audio.description.as_deref(), Some("listen up"));
    }

    #[test]
    fn absent_metadata_degrades_gracefully() {
        let step = LessonStep::normalize(
            StepId::new(1),
            LessonId::new(1),
            0,
            StepKind::Quiz,
            None,
            None,
            None,
        );
        let StepContent::Quiz(quiz) = step.content() else {
            panic!("expected quiz");
        };
        assert!(quiz.question.is_empty());
        assert!(quiz.options.is_empty());
        assert!(quiz.correct_option_id.is_none());
    }

    #[test]
    fn unknown_kind_tag_is_rejected() {
        let err = StepKind::parse("video").unwrap_err();
        assert_eq!(
            err,
            StepError::UnknownKind {
                kind: "video".into()
            }
        );
    }
}
