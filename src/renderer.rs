use async_trait::async_trait;

use crate::error::SpinnerResult;

/// Terminal classification of the monitored operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Pending,
    Success,
    Failure,
}

/// A progress indicator that runs in the background until told how the
/// operation ended.
#[async_trait]
pub trait Renderer: Send {
    /// Start drawing. Returns immediately.
    fn run(&mut self) -> SpinnerResult<()>;

    /// Draw the success line. Resolves only once it has been written.
    async fn success(&mut self) -> SpinnerResult<()>;

    /// Draw the failure line. Resolves only once it has been written.
    async fn fail(&mut self) -> SpinnerResult<()>;
}
