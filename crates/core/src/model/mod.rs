mod ids;
mod lesson;
mod media;
mod step;
mod unit;

pub use ids::{LessonId, ParseIdError, StepId, UnitId, UserId};
pub use lesson::{Lesson, LessonError};
pub use media::MediaUri;
pub use step::{
    AudioStep, FlashcardStep, LessonStep, QuizOption, QuizStep, ReadStep, StepContent, StepError,
    StepKind,
};
pub use unit::{Unit, UnitError};
