use thiserror::Error;

use crate::model::{LessonError, StepError, UnitError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Step(#[from] StepError),
}
