//! Engine error types.
//!
//! Every registry, scheduler and backend-facing operation reports failure
//! through [`EngineError`]. Backends report their own failures with
//! [`BackendError`], which converts into [`EngineError::Backend`] via `?`.

use std::fmt;

use thiserror::Error;

/// Which registry an id-addressed error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Model,
    Point,
    Line,
    Text,
    Sound,
    Font,
    TimeEvent,
    Video,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Model => "model",
            EntityKind::Point => "point",
            EntityKind::Line => "line",
            EntityKind::Text => "text",
            EntityKind::Sound => "sound",
            EntityKind::Font => "font",
            EntityKind::TimeEvent => "time event",
            EntityKind::Video => "video",
        };
        f.write_str(name)
    }
}

/// Failure reported by a rendering, audio, font or input backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A resource (texture, font, sample) could not be loaded from `path`.
    #[error("failed to load '{path}': {reason}")]
    Load { path: String, reason: String },

    /// A handle was used that the backend does not know about.
    #[error("unknown backend handle {0}")]
    UnknownHandle(u64),

    /// The backend subsystem is not available.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Any other failure of a single backend call.
    #[error("{0}")]
    Call(String),
}

/// Errors produced by the engine core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// `create` was called with an id that already exists.
    #[error("{kind} with id {id} already exists")]
    DuplicateId { kind: EntityKind, id: u32 },

    /// An operation addressed an id that does not exist (or is tombstoned).
    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: u32 },

    /// A parameter was rejected (z-index 0, malformed rectangle, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A backend call failed.
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    /// A thread-sensitive operation was called while the producer mode is active.
    #[error("concurrency misuse: {0}")]
    ConcurrencyMisuse(&'static str),

    /// A subsystem failed to start.
    #[error("initialization failed: {0}")]
    Init(String),

    /// The configuration file could not be read or written.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidArgument(msg.into())
    }

    /// True for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_registry() {
        let err = EngineError::DuplicateId {
            kind: EntityKind::TimeEvent,
            id: 7,
        };
        assert_eq!(err.to_string(), "time event with id 7 already exists");
    }

    #[test]
    fn backend_errors_convert() {
        fn fails() -> EngineResult<()> {
            Err(BackendError::UnknownHandle(3))?;
            Ok(())
        }
        assert_eq!(
            fails(),
            Err(EngineError::Backend(BackendError::UnknownHandle(3)))
        );
    }
}
