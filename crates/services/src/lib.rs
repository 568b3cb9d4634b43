#![forbid(unsafe_code)]

pub mod auth;
pub mod error;
pub mod lessons;
pub mod steps;

pub use lesson_core::Clock;

pub use auth::{AuthError, AuthProvider, StaticAuth};
pub use error::{CompletionError, LoadError, PlaybackError};

pub use lessons::{
    AdvanceOutcome, LessonFinished, LessonLoopService, LessonPathItem, LessonProgress,
    PathService, StepRunner, UnitContext, UnitPathItem,
};
pub use steps::{
    AudioHandle, AudioPhase, AudioPlayback, AudioTransport, FlipBoard, QuizBoard, QuizFeedback,
    TransportStatus,
};
