//! Error taxonomy for the toolfuse system.
//!
//! Compilation is total for ordinary inputs: malformed batches produce
//! zero-valued results and internal faults surface as `success = false` on
//! the compilation result. The error types here cover the remaining cases,
//! such as invalid configuration, cache serialization faults, and
//! per-operation executor failures.

use thiserror::Error;

/// Errors that occur around the compilation pipeline.
///
/// Note that `compile` itself never returns these for ordinary input; they
/// are produced by the surrounding machinery (cache keying, plan
/// serialization).
#[derive(Debug, Error)]
pub enum CompileError {
    /// Invalid fusion configuration.
    #[error("Invalid fusion config: {message}")]
    InvalidConfig {
        /// Description of the offending field.
        message: String,
    },

    /// Cache bookkeeping failure.
    #[error("Cache error: {message}")]
    Cache {
        /// Description of the cache failure.
        message: String,
    },

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors that occur during plan execution.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Scheduler error: general.
    #[error("Scheduler error: {message}")]
    Scheduler {
        /// Error message describing the scheduler failure.
        message: String,
    },

    /// Invalid executor configuration.
    #[error("Invalid executor config: {message}")]
    InvalidConfig {
        /// Description of the offending field.
        message: String,
    },

    /// Execution cancelled before completion.
    #[error("Execution cancelled")]
    Cancelled,

    /// The plan references an invocation id missing from the batch.
    #[error("Unknown invocation {invocation_id} referenced by the plan")]
    UnknownInvocation {
        /// Invocation id with no matching entry in the compiled batch.
        invocation_id: String,
    },
}

/// Errors produced by tool executors.
///
/// These cross the [`crate::traits::ToolExecutor`] boundary per operation;
/// the engine records them in that operation's outcome rather than
/// propagating them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    /// The arguments were rejected before the tool ran.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tool is not permitted by the executing sandbox.
    #[error("tool not permitted: {0}")]
    NotPermitted(String),

    /// The call exceeded its time budget.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The tool ran and failed.
    #[error("execution failed: {0}")]
    Failed(String),
}
