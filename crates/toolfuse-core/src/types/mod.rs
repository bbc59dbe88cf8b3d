//! Core types for the toolfuse system.

pub mod definition;
pub mod fusion;
pub mod graph;
pub mod invocation;
pub mod outcome;

pub use definition::ToolDefinition;
pub use fusion::{CompilationMetrics, CompilationResult, FusedOperation};
pub use graph::DependencyGraph;
pub use invocation::{JsonMap, JsonValue, ToolInvocation};
pub use outcome::{ExecutionResult, OpStatus, OperationOutcome};
