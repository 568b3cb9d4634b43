mod audio;
mod flashcard;
mod quiz;

// Public API of the per-step interaction machines.
pub use audio::{AudioHandle, AudioPhase, AudioPlayback, AudioTransport, TransportStatus};
pub use flashcard::FlipBoard;
pub use quiz::{QuizBoard, QuizFeedback};
