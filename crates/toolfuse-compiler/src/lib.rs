//! Toolfuse Compiler - Turns a batch of planned tool invocations into a
//! parallel-safe execution plan.
//!
//! The pipeline runs leaf-first:
//! - **Dependency analysis**: infer must-happen-before edges from resource
//!   conflicts ([`analyzer`]).
//! - **Fusion**: group compatible independent invocations into fused
//!   operations and estimate the savings ([`fusion`]).
//! - **Definition optimization**: merge related static tool schemas into
//!   synthetic combined entries ([`definitions`]).
//! - **Integration**: thin adapters mapping single-agent and team batches
//!   onto the compiler ([`integration`]).
//!
//! # Example
//!
//! ```
//! use toolfuse_compiler::{FusionCompiler, FusionConfig};
//! use toolfuse_core::ToolInvocation;
//!
//! let invocations = vec![
//!     ToolInvocation::new("1", "read").with_argument("path", "a").with_estimated_cost(150),
//!     ToolInvocation::new("2", "read").with_argument("path", "b").with_estimated_cost(150),
//! ];
//!
//! let compiler = FusionCompiler::new();
//! let result = compiler.compile(&invocations, &FusionConfig::default());
//! assert_eq!(result.fused_operation_count, 1);
//! ```

pub mod analyzer;
pub mod cache;
pub mod definitions;
pub mod fusion;
pub mod integration;

pub use analyzer::{
    AccessMode, DependencyAnalyzer, NamingHeuristicExtractor, ResourceAccess, ResourceKeyExtractor,
};
pub use cache::CompilationCache;
pub use definitions::{optimize_tool_definitions, DefinitionOptimization, DefinitionSavings};
pub use fusion::{FusionCompiler, FusionConfig};
pub use integration::{
    integrate_with_single_agent, integrate_with_team, should_use_fusion, SingleAgentIntegration,
};

// Re-export commonly used types
pub use toolfuse_core::{CompilationMetrics, CompilationResult, DependencyGraph, FusedOperation};
