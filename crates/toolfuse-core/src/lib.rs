//! Toolfuse Core - Core types and traits for the toolfuse system.
//!
//! This crate provides the data model shared by the compiler and the runtime:
//! invocations, dependency graphs, fused operations, compilation and execution
//! results, the error taxonomy, and the executor contract.

pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use error::{CompileError, ExecutionError, RuntimeError};

pub use traits::{FnExecutor, ToolExecutor};

pub use types::{
    CompilationMetrics, CompilationResult, DependencyGraph, ExecutionResult, FusedOperation,
    JsonMap, JsonValue, OpStatus, OperationOutcome, ToolDefinition, ToolInvocation,
};
