use thiserror::Error;

/// Misuse and configuration errors. Sink failures never surface here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerError {
    #[error("progress glyph sequence is empty")]
    EmptyGlyphs,

    #[error("spinner is already running")]
    AlreadyRunning,

    #[error("spinner was never started")]
    NotStarted,

    #[error("spinner has already finished")]
    AlreadyFinished,

    #[error("spinner must be started inside a Tokio runtime")]
    NoRuntime,
}

pub type SpinnerResult<T> = Result<T, SpinnerError>;
