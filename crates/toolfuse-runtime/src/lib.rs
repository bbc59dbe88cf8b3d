//! Toolfuse Runtime - Execution engine for compiled tool-call plans.
//!
//! The engine consumes a [`CompilationResult`] and a caller-supplied
//! [`ToolExecutor`], runs operations in dependency order with bounded
//! parallelism, and reports per-operation outcomes plus end-to-end timing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolfuse_core::error::ExecutionError;
//! use toolfuse_core::types::JsonMap;
//! use toolfuse_core::{FnExecutor, ToolInvocation};
//! use toolfuse_compiler::{FusionCompiler, FusionConfig};
//! use toolfuse_runtime::{ExecutionEngine, ExecutorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let invocations = vec![ToolInvocation::new("1", "read").with_argument("path", "a")];
//!     let compiled = FusionCompiler::new().compile(&invocations, &FusionConfig::default());
//!
//!     let executor = Arc::new(FnExecutor::new(|_name: String, _args: JsonMap| async move {
//!         Ok::<_, ExecutionError>(serde_json::json!("ok"))
//!     }));
//!
//!     let engine = ExecutionEngine::new(ExecutorConfig::default());
//!     let result = engine.execute(&compiled, executor).await?;
//!     assert!(result.success);
//!     Ok(())
//! }
//! ```

pub mod concurrency;
pub mod config;
pub mod engine;
pub mod sandbox;

pub use concurrency::{ConcurrencyControl, ConcurrencyPermit};
pub use config::ExecutorConfig;
pub use engine::ExecutionEngine;
pub use sandbox::{SandboxPolicy, SandboxedExecutor};

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

// Re-export commonly used types
pub use toolfuse_core::{
    error::RuntimeError,
    types::{ExecutionResult, OpStatus, OperationOutcome},
};
