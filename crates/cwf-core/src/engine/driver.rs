use super::error::EngineError;
use super::generator::{InputGenerator, SubmissionSpec};
use crate::core::models::results::RelaxNode;

/// How a workflow treats a relaxation that finished without converging.
///
/// Engines differ in whether they report convergence at all; when they do, the
/// common layer neither retries nor guesses. The choice between carrying the
/// partial result and rejecting it is the caller's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergencePolicy {
    /// Carry the result, with `converged: Some(false)` preserved on the outputs.
    #[default]
    AcceptUnconverged,
    /// Treat non-convergence as a failure of the run.
    RejectUnconverged,
}

/// Executes one submission into a completed relaxation.
///
/// A driver wraps a single engine's native relaxation procedure. `run` is
/// long-running and blocks the calling thread; concurrency is layered on top by the
/// workflows, which fan submissions out over a thread pool. Drivers hold no shared
/// mutable state, so concurrent `run` calls on independent specs are safe.
pub trait RelaxDriver: Send + Sync {
    fn engine_name(&self) -> &'static str;

    /// The input generator matching this driver's engine.
    fn generator(&self) -> Box<dyn InputGenerator>;

    /// Executes the relaxation described by `spec`.
    ///
    /// Engine non-convergence is not an error at this level: the result is returned
    /// with its `converged` flag set, and policy is applied by the caller. Resource
    /// exhaustion and crashes surface as [`EngineError::Execution`].
    fn run(&self, spec: &SubmissionSpec) -> Result<RelaxNode, EngineError>;
}
