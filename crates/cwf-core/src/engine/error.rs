use crate::core::models::structure::StructureError;
use thiserror::Error;

/// The error taxonomy of the common workflow interface.
///
/// Input validation errors (`Configuration`, `Validation`, `UnsupportedOption`,
/// `Incompatibility`) are raised synchronously when a builder or submission spec is
/// constructed. Execution errors surface asynchronously and, inside an
/// equation-of-state series, are recorded per index instead of aborting siblings.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid protocol name, illegal relax-type/workflow combination, or a missing
    /// required builder field.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed numeric input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The engine does not support the requested option.
    #[error("engine `{engine}` does not support {option}")]
    UnsupportedOption { engine: String, option: String },

    /// The supplied reference run cannot be reused by this engine.
    #[error("incompatible reference: {0}")]
    Incompatibility(String),

    /// Registry lookup failure, distinct from an engine lacking a capability.
    #[error("`{0}` is not a registered engine")]
    UnknownEngine(String),

    /// The underlying run failed. Surfaced, never retried at this layer.
    #[error("execution failed: {0}")]
    Execution(String),

    /// The engine reported non-convergence and the caller's policy rejects
    /// partial results.
    #[error("relaxation did not converge within the engine's iteration limit")]
    Unconverged,

    #[error("invalid structure: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },
}
