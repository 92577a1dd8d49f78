use thiserror::Error;

/// Runtime error type for tape execution and construction-time evaluation.
///
/// Invariant violations (out-of-range indices, input-count mismatches,
/// malformed loops) are programmer errors and panic with a descriptive
/// message instead of returning one of these variants. `Error` covers the
/// failures a correct program can still run into: unresolved values,
/// ill-typed calls, and failures raised by user-supplied functions, which
/// propagate unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("undefined value %{id}")]
    UndefinedValue { id: usize },

    #[error("callee %{id} is not a function")]
    NotAFunction { id: usize },

    #[error("type error: {detail}")]
    TypeError { detail: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("exceeded step limit of {limit} (non-terminating loop?)")]
    StepLimit { limit: usize },

    #[error("tape has no result variable")]
    NoResult,

    #[error("{0}")]
    Custom(String),
}
