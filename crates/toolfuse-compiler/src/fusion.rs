//! Fusion engine.
//!
//! Groups compatible independent invocations into fused operations,
//! estimates the token savings of issuing them together, and assembles the
//! [`CompilationResult`] the execution engine consumes.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use toolfuse_core::fuse_compile;
use toolfuse_core::types::{
    CompilationMetrics, CompilationResult, DependencyGraph, FusedOperation, ToolInvocation,
};

use crate::analyzer::DependencyAnalyzer;
use crate::cache::CompilationCache;

/// Configuration for the fusion compiler.
///
/// Controls the savings threshold, dependency analysis, and the
/// definition-side fusion floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Minimum aggregate savings required to recommend fusion.
    ///
    /// Default: 100
    #[serde(default = "default_min_token_savings_threshold")]
    pub min_token_savings_threshold: u64,

    /// Advisory parallelism cap used when bucketing the parallelizable
    /// count. Execution applies its own cap.
    ///
    /// Default: Number of logical CPUs
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// When false, skip dependency analysis and treat all invocations as
    /// independent.
    ///
    /// Default: true
    #[serde(default = "default_enable_dependency_analysis")]
    pub enable_dependency_analysis: bool,

    /// Minimum number of advertised tool definitions before the definition
    /// optimizer synthesizes combined schemas.
    ///
    /// Default: 3
    #[serde(default = "default_min_tools_for_fusion")]
    pub min_tools_for_fusion: usize,

    /// Fixed per-call overhead a fused group still pays once.
    ///
    /// Default: 50
    #[serde(default = "default_fusion_overhead")]
    pub fusion_overhead: u64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            min_token_savings_threshold: default_min_token_savings_threshold(),
            max_parallelism: default_max_parallelism(),
            enable_dependency_analysis: default_enable_dependency_analysis(),
            min_tools_for_fusion: default_min_tools_for_fusion(),
            fusion_overhead: default_fusion_overhead(),
        }
    }
}

impl FusionConfig {
    /// Create a new fusion configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum savings threshold.
    pub fn with_min_token_savings_threshold(mut self, threshold: u64) -> Self {
        self.min_token_savings_threshold = threshold;
        self
    }

    /// Set the advisory parallelism cap.
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    /// Enable or disable dependency analysis.
    pub fn with_dependency_analysis(mut self, enabled: bool) -> Self {
        self.enable_dependency_analysis = enabled;
        self
    }

    /// Set the definition-side fusion floor.
    pub fn with_min_tools_for_fusion(mut self, min_tools: usize) -> Self {
        self.min_tools_for_fusion = min_tools;
        self
    }

    /// Set the fixed fusion overhead.
    pub fn with_fusion_overhead(mut self, overhead: u64) -> Self {
        self.fusion_overhead = overhead;
        self
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_parallelism == 0 {
            return Err("max_parallelism must be > 0".to_string());
        }
        if self.min_tools_for_fusion < 2 {
            return Err("min_tools_for_fusion must be >= 2".to_string());
        }
        Ok(())
    }
}

// Default functions for serde
fn default_min_token_savings_threshold() -> u64 {
    100
}

fn default_max_parallelism() -> usize {
    num_cpus::get().max(1)
}

fn default_enable_dependency_analysis() -> bool {
    true
}

fn default_min_tools_for_fusion() -> usize {
    3
}

fn default_fusion_overhead() -> u64 {
    50
}

/// Compiles invocation batches into fused, dependency-ordered plans.
pub struct FusionCompiler {
    analyzer: DependencyAnalyzer,
}

impl FusionCompiler {
    /// Creates a compiler with the default dependency analyzer.
    pub fn new() -> Self {
        FusionCompiler {
            analyzer: DependencyAnalyzer::new(),
        }
    }

    /// Creates a compiler with a caller-supplied analyzer (e.g. one with a
    /// custom resource extractor).
    pub fn with_analyzer(analyzer: DependencyAnalyzer) -> Self {
        FusionCompiler { analyzer }
    }

    /// Compiles a batch into a plan.
    ///
    /// Total for any input: an empty batch yields a valid zero-valued
    /// result, and inferred cycles are reported through
    /// `metrics.has_circular_dependencies` rather than raised. `success`
    /// turns false only on an internal invariant violation.
    pub fn compile(
        &self,
        invocations: &[ToolInvocation],
        config: &FusionConfig,
    ) -> CompilationResult {
        if invocations.is_empty() {
            return CompilationResult::empty();
        }

        let compile_start = Instant::now();

        // Dependency analysis
        let analysis_start = Instant::now();
        let graph = if config.enable_dependency_analysis {
            self.analyzer.analyze(invocations)
        } else {
            let mut graph = DependencyGraph::new();
            for invocation in invocations {
                graph.add_node(invocation.id.as_str());
            }
            graph
        };
        let dependency_analysis_time_ms = analysis_start.elapsed().as_millis();
        let has_circular_dependencies = graph.detect_cycles();

        // Fusion
        let fusion_start = Instant::now();
        let groups = group_by_name(invocations, &graph);
        let fused_operations: Vec<FusedOperation> = groups
            .iter()
            .map(|members| build_fused_operation(members, &graph, config))
            .collect();
        let fusion_time_ms = fusion_start.elapsed().as_millis();

        let total_token_savings = fused_operations
            .iter()
            .map(|f| f.estimated_token_savings)
            .sum();
        let parallelizable_count = fused_operations
            .iter()
            .filter(|f| f.can_parallelize)
            .map(|f| f.member_count().min(config.max_parallelism.max(1)))
            .sum();

        // Defensive invariant: every graph node must come from the batch.
        let known_ids: HashSet<&str> = invocations.iter().map(|i| i.id.as_str()).collect();
        let success = graph
            .node_ids()
            .iter()
            .all(|id| known_ids.contains(id.as_str()));

        let metrics = CompilationMetrics {
            compilation_time_ms: compile_start.elapsed().as_millis(),
            dependency_analysis_time_ms,
            fusion_time_ms,
            max_dependency_depth: graph.max_depth(),
            average_dependencies: graph.mean_in_degree(),
            has_circular_dependencies,
        };

        fuse_compile!(debug,
            invocations = invocations.len(),
            fused_operations = fused_operations.len(),
            total_token_savings = total_token_savings,
            circular = has_circular_dependencies,
            "Compilation finished"
        );

        CompilationResult {
            original_tool_count: invocations.len(),
            fused_operation_count: fused_operations.len(),
            total_token_savings,
            parallelizable_count,
            fused_operations,
            invocations: invocations.to_vec(),
            dependency_graph: graph,
            metrics,
            success,
        }
    }

    /// Compiles through a caller-owned cache.
    ///
    /// A hit clones the stored result; timing fields are the original
    /// compile's.
    pub fn compile_cached(
        &self,
        invocations: &[ToolInvocation],
        config: &FusionConfig,
        cache: &mut CompilationCache,
    ) -> CompilationResult {
        let key = CompilationCache::key(invocations, config);
        if let Some(result) = cache.lookup(&key) {
            fuse_compile!(debug, key = %key, "Compilation cache hit");
            return result;
        }
        let result = self.compile(invocations, config);
        cache.store(key, result.clone());
        result
    }
}

impl Default for FusionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups invocations sharing an operation name with no dependency edge to
/// one another, preserving submission order within each group.
///
/// An invocation joins the first existing group (for its name) with which it
/// shares no edge in either direction; otherwise it opens a new group.
fn group_by_name<'a>(
    invocations: &'a [ToolInvocation],
    graph: &DependencyGraph,
) -> Vec<Vec<&'a ToolInvocation>> {
    let mut groups: Vec<Vec<&'a ToolInvocation>> = Vec::new();
    let mut groups_by_name: HashMap<&'a str, Vec<usize>> = HashMap::new();

    for invocation in invocations {
        let candidates = groups_by_name.entry(invocation.name.as_str()).or_default();

        let placed = candidates.iter().copied().find(|&gi| {
            groups[gi]
                .iter()
                .all(|member| !graph.linked(&invocation.id, &member.id))
        });

        match placed {
            Some(gi) => groups[gi].push(invocation),
            None => {
                candidates.push(groups.len());
                groups.push(vec![invocation]);
            }
        }
    }

    groups
}

/// Builds one fused operation from a candidate group.
fn build_fused_operation(
    members: &[&ToolInvocation],
    graph: &DependencyGraph,
    config: &FusionConfig,
) -> FusedOperation {
    let estimated_token_savings = if members.len() >= 2 {
        let total: u64 = members.iter().map(|m| m.estimated_cost).sum();
        let max = members.iter().map(|m| m.estimated_cost).max().unwrap_or(0);
        // Fusing amortizes the fixed per-call overhead but still pays for
        // the single most expensive member.
        total.saturating_sub(max + config.fusion_overhead)
    } else {
        0
    };

    // The grouping criterion already excludes dependency-linked pairs;
    // recomputed here so hand-built groups stay honest.
    let can_parallelize = members.iter().enumerate().all(|(i, a)| {
        members[i + 1..]
            .iter()
            .all(|b| !graph.linked(&a.id, &b.id))
    });

    FusedOperation {
        member_ids: members.iter().map(|m| m.id.clone()).collect(),
        estimated_token_savings,
        can_parallelize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(id: &str, path: &str, cost: u64) -> ToolInvocation {
        ToolInvocation::new(id, "read")
            .with_argument("path", path)
            .with_estimated_cost(cost)
    }

    fn write(id: &str, path: &str, cost: u64) -> ToolInvocation {
        ToolInvocation::new(id, "write")
            .with_argument("path", path)
            .with_estimated_cost(cost)
    }

    #[test]
    fn test_default_config() {
        let config = FusionConfig::default();
        assert_eq!(config.min_token_savings_threshold, 100);
        assert!(config.max_parallelism > 0);
        assert!(config.enable_dependency_analysis);
        assert_eq!(config.min_tools_for_fusion, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = FusionConfig::new()
            .with_min_token_savings_threshold(250)
            .with_max_parallelism(8)
            .with_dependency_analysis(false)
            .with_min_tools_for_fusion(4)
            .with_fusion_overhead(10);

        assert_eq!(config.min_token_savings_threshold, 250);
        assert_eq!(config.max_parallelism, 8);
        assert!(!config.enable_dependency_analysis);
        assert_eq!(config.min_tools_for_fusion, 4);
        assert_eq!(config.fusion_overhead, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_parallelism() {
        let config = FusionConfig {
            max_parallelism: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_batch() {
        let result = FusionCompiler::new().compile(&[], &FusionConfig::default());
        assert!(result.is_empty());
        assert!(result.success);
        assert_eq!(result.fused_operation_count, 0);
        assert_eq!(result.total_token_savings, 0);
    }

    #[test]
    fn test_single_invocation_is_singleton_with_zero_savings() {
        let result =
            FusionCompiler::new().compile(&[read("1", "a", 500)], &FusionConfig::default());

        assert_eq!(result.fused_operation_count, 1);
        assert_eq!(result.total_token_savings, 0);
        assert!(result.fused_operations[0].is_singleton());
    }

    #[test]
    fn test_three_reads_fuse_into_one_parallel_group() {
        let invocations = vec![read("1", "a", 150), read("2", "b", 150), read("3", "c", 150)];
        let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

        assert_eq!(result.fused_operation_count, 1);
        assert!(result.fused_operations[0].can_parallelize);
        assert_eq!(result.fused_operations[0].member_ids, ["1", "2", "3"]);
        // 450 - (150 + 50 overhead) = 250
        assert_eq!(result.total_token_savings, 250);
        assert!(result.total_token_savings > 0);
    }

    #[test]
    fn test_distinct_names_never_share_a_group() {
        let invocations = vec![
            ToolInvocation::new("1", "read").with_estimated_cost(100),
            ToolInvocation::new("2", "search").with_estimated_cost(100),
            ToolInvocation::new("3", "fetch").with_estimated_cost(100),
        ];
        let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

        assert_eq!(result.fused_operation_count, 3);
        assert!(result.fused_operations.iter().all(|f| f.is_singleton()));
        assert_eq!(result.total_token_savings, 0);
    }

    #[test]
    fn test_dependency_linked_same_name_invocations_split() {
        // Both named "write" on the same path: linked by a WAW edge, so
        // they must land in separate groups.
        let invocations = vec![write("1", "a", 100), write("2", "a", 100)];
        let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

        assert_eq!(result.fused_operation_count, 2);
        assert!(result.dependency_graph.depends_on("2", "1"));
    }

    #[test]
    fn test_disabled_dependency_analysis_treats_all_as_independent() {
        let invocations = vec![write("1", "a", 100), write("2", "a", 100)];
        let config = FusionConfig::new().with_dependency_analysis(false);
        let result = FusionCompiler::new().compile(&invocations, &config);

        assert_eq!(result.fused_operation_count, 1);
        assert_eq!(result.dependency_graph.edge_count(), 0);
        assert!(!result.metrics.has_circular_dependencies);
    }

    #[test]
    fn test_savings_floor_at_zero() {
        // 40 + 40 = 80 standalone, fused cost 40 + 50 overhead = 90.
        let invocations = vec![read("1", "a", 40), read("2", "b", 40)];
        let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

        assert_eq!(result.fused_operation_count, 1);
        assert_eq!(result.total_token_savings, 0);
    }

    #[test]
    fn test_parallelizable_count_buckets_by_cap() {
        let invocations = vec![
            read("1", "a", 150),
            read("2", "b", 150),
            read("3", "c", 150),
            read("4", "d", 150),
        ];
        let config = FusionConfig::new().with_max_parallelism(2);
        let result = FusionCompiler::new().compile(&invocations, &config);

        assert_eq!(result.fused_operation_count, 1);
        assert_eq!(result.parallelizable_count, 2);
    }

    #[test]
    fn test_metrics_shape() {
        let invocations = vec![
            write("w", "a", 100),
            read("r1", "a", 100),
            read("r2", "a", 100),
        ];
        let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

        assert_eq!(result.metrics.max_dependency_depth, 1);
        assert!(result.metrics.average_dependencies > 0.0);
        assert!(!result.metrics.has_circular_dependencies);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let invocations = vec![
            write("w", "a", 200),
            read("r1", "a", 150),
            read("r2", "b", 150),
            ToolInvocation::new("s", "search").with_estimated_cost(90),
        ];
        let config = FusionConfig::default();
        let compiler = FusionCompiler::new();

        let first = compiler.compile(&invocations, &config);
        let second = compiler.compile(&invocations, &config);

        assert_eq!(first.fused_operation_count, second.fused_operation_count);
        assert_eq!(first.total_token_savings, second.total_token_savings);
        assert_eq!(first.parallelizable_count, second.parallelizable_count);
        assert_eq!(first.fused_operations, second.fused_operations);
        assert_eq!(first.dependency_graph, second.dependency_graph);
        assert_eq!(
            first.metrics.has_circular_dependencies,
            second.metrics.has_circular_dependencies
        );
    }
}
