//! End-to-end compilation properties: grouping, savings, dependency
//! inference, recommendation thresholds, caching, and the definition
//! optimizer.

use std::collections::HashMap;

use toolfuse_compiler::{
    integrate_with_single_agent, integrate_with_team, optimize_tool_definitions, CompilationCache,
    FusionCompiler, FusionConfig,
};
use toolfuse_core::types::{ToolDefinition, ToolInvocation};

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
fn empty_batch_compiles_to_zero_counts() {
    let result = FusionCompiler::new().compile(&[], &FusionConfig::default());

    assert_eq!(result.original_tool_count, 0);
    assert_eq!(result.fused_operation_count, 0);
    assert_eq!(result.total_token_savings, 0);
    assert_eq!(result.parallelizable_count, 0);
    assert!(result.success);
}

#[test]
fn single_invocation_never_recommends_fusion() {
    for threshold in [0, 1, 100, 10_000] {
        let config = FusionConfig::new().with_min_token_savings_threshold(threshold);
        let integration = integrate_with_single_agent(&[read("1", "a", 5_000)], &config);

        assert_eq!(integration.compiled.fused_operation_count, 1);
        assert_eq!(integration.compiled.total_token_savings, 0);
        assert!(
            !integration.should_use_fusion,
            "threshold {threshold} must not flip the recommendation for a single invocation"
        );
    }
}

#[test]
fn distinct_names_are_never_grouped() {
    let invocations: Vec<ToolInvocation> = (0..6)
        .map(|i| {
            ToolInvocation::new(format!("{i}"), format!("tool_{i}")).with_estimated_cost(100)
        })
        .collect();
    let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

    assert_eq!(result.fused_operation_count, 6);
    assert!(result.fused_operations.iter().all(|f| f.is_singleton()));
}

#[test]
fn write_then_read_produces_a_read_after_write_edge() {
    let invocations = vec![
        write("w", "/tmp/shared", 200),
        read("r", "/tmp/shared", 100),
    ];
    let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

    assert!(result.dependency_graph.depends_on("r", "w"));
    assert_eq!(result.metrics.max_dependency_depth, 1);
    assert!(!result.metrics.has_circular_dependencies);
}

#[test]
fn three_same_name_reads_fuse_with_positive_savings() {
    let invocations = vec![read("1", "a", 150), read("2", "b", 150), read("3", "c", 150)];
    let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

    assert_eq!(result.fused_operation_count, 1);
    let fused = &result.fused_operations[0];
    assert_eq!(fused.member_ids, ["1", "2", "3"]);
    assert!(fused.can_parallelize);
    assert!(result.total_token_savings > 0);
}

#[test]
fn recommendation_is_a_pure_threshold_function() {
    // Savings for this batch: 3*150 - (150 + 50) = 250.
    let invocations = vec![read("1", "a", 150), read("2", "b", 150), read("3", "c", 150)];

    for (threshold, expected) in [
        (0u64, true),
        (100, true),
        (249, true),
        (250, true),
        (251, false),
        (u64::MAX, false),
    ] {
        let config = FusionConfig::new().with_min_token_savings_threshold(threshold);
        let integration = integrate_with_single_agent(&invocations, &config);
        assert_eq!(integration.compiled.total_token_savings, 250);
        assert_eq!(integration.should_use_fusion, expected, "threshold {threshold}");
    }
}

#[test]
fn compile_is_idempotent_modulo_timing() {
    let invocations = vec![
        write("w", "a", 300),
        read("r1", "a", 150),
        read("r2", "b", 150),
        read("r3", "b", 150),
        ToolInvocation::new("s", "search")
            .with_argument("query", "rust")
            .with_estimated_cost(80),
    ];
    let config = FusionConfig::default();
    let compiler = FusionCompiler::new();

    let first = compiler.compile(&invocations, &config);
    let second = compiler.compile(&invocations, &config);

    assert_eq!(first.original_tool_count, second.original_tool_count);
    assert_eq!(first.fused_operation_count, second.fused_operation_count);
    assert_eq!(first.total_token_savings, second.total_token_savings);
    assert_eq!(first.parallelizable_count, second.parallelizable_count);
    assert_eq!(first.fused_operations, second.fused_operations);
    assert_eq!(first.dependency_graph, second.dependency_graph);
    assert_eq!(
        first.metrics.max_dependency_depth,
        second.metrics.max_dependency_depth
    );
    assert_eq!(
        first.metrics.average_dependencies,
        second.metrics.average_dependencies
    );
}

#[test]
fn indirect_dependencies_do_not_block_grouping() {
    // r2 reads what w wrote, so r2 and r1 stay fusable but w's edge to r2
    // must not leak into r1's group membership.
    let invocations = vec![
        read("r1", "other", 150),
        write("w", "shared", 200),
        read("r2", "shared", 150),
    ];
    let result = FusionCompiler::new().compile(&invocations, &FusionConfig::default());

    assert!(result.dependency_graph.depends_on("r2", "w"));
    // r1 and r2 share a name and no edge: same group.
    let read_group = result
        .fused_operations
        .iter()
        .find(|f| f.member_ids.contains(&"r1".to_string()))
        .expect("read group");
    assert_eq!(read_group.member_ids, ["r1", "r2"]);
}

#[test]
fn cached_compilation_matches_fresh_compilation() {
    let invocations = vec![read("1", "a", 150), read("2", "b", 150)];
    let config = FusionConfig::default();
    let compiler = FusionCompiler::new();
    let mut cache = CompilationCache::new();

    let fresh = compiler.compile(&invocations, &config);
    let miss = compiler.compile_cached(&invocations, &config, &mut cache);
    let hit = compiler.compile_cached(&invocations, &config, &mut cache);

    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
    for result in [&miss, &hit] {
        assert_eq!(result.fused_operation_count, fresh.fused_operation_count);
        assert_eq!(result.total_token_savings, fresh.total_token_savings);
        assert_eq!(result.dependency_graph, fresh.dependency_graph);
    }
}

#[test]
fn team_integration_compiles_per_member_and_skips_idle() {
    let mut team = HashMap::new();
    team.insert(
        "planner".to_string(),
        vec![read("p1", "a", 150), read("p2", "b", 150)],
    );
    team.insert(
        "builder".to_string(),
        vec![write("b1", "x", 300), read("b2", "x", 100)],
    );
    team.insert("observer".to_string(), Vec::new());

    let results = integrate_with_team(&team, &FusionConfig::default());

    assert_eq!(results.len(), 2);
    assert_eq!(results["planner"].fused_operation_count, 1);
    assert!(results["builder"].dependency_graph.depends_on("b2", "b1"));
    assert!(!results.contains_key("observer"));
}

#[test]
fn definition_optimizer_is_total_on_degenerate_input() {
    let config = FusionConfig::default();

    let none = optimize_tool_definitions(&[], &config);
    assert!(none.optimized_tools.is_empty());
    assert_eq!(none.estimated_savings.token_reduction, 0);

    let one = optimize_tool_definitions(&[ToolDefinition::new("solo", "only tool")], &config);
    assert_eq!(one.optimized_tools.len(), 1);
    assert!(one.fusion_mapping.is_empty());
}

#[test]
fn definition_optimizer_merges_related_schemas() {
    let definitions = vec![
        ToolDefinition::new("file_read", "Read a file"),
        ToolDefinition::new("file_write", "Write a file"),
        ToolDefinition::new("file_stat", "Stat a file"),
        ToolDefinition::new("http_get", "Fetch a URL"),
    ];
    let result = optimize_tool_definitions(&definitions, &FusionConfig::default());

    assert_eq!(result.optimized_tools.len(), 2);
    let (fused_name, members) = result
        .fusion_mapping
        .iter()
        .next()
        .expect("one synthetic entry");
    assert!(fused_name.starts_with("fused_"));
    assert_eq!(members.len(), 3);
    assert!(result.estimated_savings.token_reduction > 0);
}
