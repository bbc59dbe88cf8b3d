//! Fused operations and compilation results.
//!
//! A [`FusedOperation`] groups independent invocations that are safe to issue
//! as a unit; the [`CompilationResult`] carries the full plan (groups,
//! dependency graph, and the invocation batch) plus the metrics callers
//! inspect to decide whether fusion is worthwhile.

use serde::{Deserialize, Serialize};

use crate::types::{DependencyGraph, ToolInvocation};

/// A group of invocations considered safe to execute as a unit.
///
/// Members never include invocations connected by a dependency edge.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FusedOperation {
    /// Member invocation ids, in submission order.
    pub member_ids: Vec<String>,
    /// Standalone cost sum minus the fused cost (max member + fixed
    /// overhead), floored at zero.
    pub estimated_token_savings: u64,
    /// True when members share no dependency edges among themselves.
    pub can_parallelize: bool,
}

impl FusedOperation {
    /// Number of member invocations.
    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    /// True for groups of exactly one invocation.
    pub fn is_singleton(&self) -> bool {
        self.member_ids.len() == 1
    }
}

/// Timing and shape metrics for one compilation pass.
///
/// Timing fields are wall-clock milliseconds; shape fields describe the
/// dependency graph that was produced.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CompilationMetrics {
    /// End-to-end compilation time.
    pub compilation_time_ms: u128,
    /// Time spent building the dependency graph.
    pub dependency_analysis_time_ms: u128,
    /// Time spent grouping and estimating savings.
    pub fusion_time_ms: u128,
    /// Longest chain of dependency edges.
    pub max_dependency_depth: usize,
    /// Mean in-degree across the batch.
    pub average_dependencies: f64,
    /// True when the produced edges contain a cycle.
    pub has_circular_dependencies: bool,
}

/// The output of one compilation pass: plan plus metrics.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompilationResult {
    /// Number of invocations submitted.
    pub original_tool_count: usize,
    /// Number of fused operations produced.
    pub fused_operation_count: usize,
    /// Sum of estimated savings over all fused operations.
    pub total_token_savings: u64,
    /// Number of invocations belonging to a `can_parallelize` group,
    /// bucketed by the advisory parallelism cap.
    pub parallelizable_count: usize,
    /// The fused operations, ordered by first member submission.
    pub fused_operations: Vec<FusedOperation>,
    /// The invocation batch, carried so the engine can execute the plan
    /// without re-consulting the caller.
    pub invocations: Vec<ToolInvocation>,
    /// Must-happen-before relationships inferred for the batch.
    pub dependency_graph: DependencyGraph,
    /// Timing and shape metrics.
    pub metrics: CompilationMetrics,
    /// False only on an internal compiler fault, not on a cycle.
    pub success: bool,
}

impl CompilationResult {
    /// A valid zero-valued result for an empty batch.
    pub fn empty() -> Self {
        CompilationResult {
            original_tool_count: 0,
            fused_operation_count: 0,
            total_token_savings: 0,
            parallelizable_count: 0,
            fused_operations: Vec::new(),
            invocations: Vec::new(),
            dependency_graph: DependencyGraph::new(),
            metrics: CompilationMetrics::default(),
            success: true,
        }
    }

    /// True when nothing was compiled.
    pub fn is_empty(&self) -> bool {
        self.original_tool_count == 0
    }

    /// Looks up an invocation from the carried batch by id.
    pub fn invocation(&self, id: &str) -> Option<&ToolInvocation> {
        self.invocations.iter().find(|inv| inv.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = CompilationResult::empty();
        assert!(result.is_empty());
        assert!(result.success);
        assert_eq!(result.fused_operation_count, 0);
        assert_eq!(result.total_token_savings, 0);
        assert!(!result.metrics.has_circular_dependencies);
    }

    #[test]
    fn test_fused_operation_accessors() {
        let single = FusedOperation {
            member_ids: vec!["1".to_string()],
            estimated_token_savings: 0,
            can_parallelize: true,
        };
        assert!(single.is_singleton());
        assert_eq!(single.member_count(), 1);

        let pair = FusedOperation {
            member_ids: vec!["1".to_string(), "2".to_string()],
            estimated_token_savings: 100,
            can_parallelize: true,
        };
        assert!(!pair.is_singleton());
        assert_eq!(pair.member_count(), 2);
    }

    #[test]
    fn test_invocation_lookup() {
        let mut result = CompilationResult::empty();
        result
            .invocations
            .push(ToolInvocation::new("a", "read").with_estimated_cost(10));
        result.original_tool_count = 1;

        assert!(result.invocation("a").is_some());
        assert!(result.invocation("b").is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut result = CompilationResult::empty();
        result.invocations.push(ToolInvocation::new("a", "read"));
        result.fused_operations.push(FusedOperation {
            member_ids: vec!["a".to_string()],
            estimated_token_savings: 0,
            can_parallelize: true,
        });
        result.original_tool_count = 1;
        result.fused_operation_count = 1;

        let json = serde_json::to_string(&result).expect("serialize");
        let restored: CompilationResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(result, restored);
    }
}
