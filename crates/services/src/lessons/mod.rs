mod path;
mod progress;
mod runner;
mod workflow;

// Public API of the lesson subsystem.
pub use path::{LessonPathItem, PathService, UnitPathItem};
pub use progress::LessonProgress;
pub use runner::StepRunner;
pub use workflow::{AdvanceOutcome, LessonFinished, LessonLoopService, UnitContext};
