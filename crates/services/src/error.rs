//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Content fetch failed. No state was mutated; callers retry by re-invoking
/// the load.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Audio playback failed. Surfaced inline; lesson progression is unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackError {
    #[error("no audio source configured for this step")]
    MissingSource,

    #[error("audio transport failure: {0}")]
    Transport(String),
}

/// The completion sequence could not run.
///
/// Only identity absence aborts the sequence; persistence failures are
/// logged and deliberately do not block the learner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("no authenticated user to record completion for")]
    Identity,
}
