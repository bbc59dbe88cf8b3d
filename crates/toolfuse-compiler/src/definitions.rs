//! Tool definition optimizer.
//!
//! Unlike the fusion engine, which fuses *invocations* at call time, this
//! transform operates on the *static schema list* advertised to a model.
//! Related definitions are merged into synthetic combined entries with a
//! discriminated-union parameter shape, shrinking the token cost of
//! definition transmission.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use toolfuse_core::fuse_compile;
use toolfuse_core::types::ToolDefinition;

use crate::fusion::FusionConfig;

/// Rough per-definition transmission overhead, in tokens. Each definition
/// merged away saves about this much framing.
const DEFINITION_OVERHEAD_TOKENS: u64 = 60;

/// Operation-name fragments that mark a definition as mutating.
/// Mirrors the invocation-side write heuristic.
const WRITE_VERBS: &[&str] = &[
    "write", "create", "delete", "update", "remove", "append", "edit", "move", "put", "set",
];

/// Estimated payoff of a definition optimization pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DefinitionSavings {
    /// Heuristic token reduction, proportional to definitions merged.
    pub token_reduction: u64,
    /// Fraction of merged tools that are mutually independent (read-only).
    pub parallelism_gain: f64,
}

/// Result of optimizing a definition list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DefinitionOptimization {
    /// The optimized definition list, synthetic entries included.
    pub optimized_tools: Vec<ToolDefinition>,
    /// Maps each synthetic name to the original names it replaces.
    pub fusion_mapping: HashMap<String, Vec<String>>,
    /// Heuristic savings estimate.
    pub estimated_savings: DefinitionSavings,
}

/// Merges schemas for tools that belong together into synthetic combined
/// entries.
///
/// Definitions are bucketed by shared name prefix (text before the first
/// `_`, or the whole name); buckets of two or more merge into one
/// `fused_*` entry whose parameters form a discriminated union. Below
/// `min_tools_for_fusion` the input passes through untouched. Never panics
/// on empty input.
pub fn optimize_tool_definitions(
    definitions: &[ToolDefinition],
    config: &FusionConfig,
) -> DefinitionOptimization {
    if definitions.len() < config.min_tools_for_fusion.max(2) {
        return DefinitionOptimization {
            optimized_tools: definitions.to_vec(),
            fusion_mapping: HashMap::new(),
            estimated_savings: DefinitionSavings::default(),
        };
    }

    // Bucket by name prefix, preserving first-seen bucket order.
    let mut bucket_order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<&ToolDefinition>> = HashMap::new();
    for definition in definitions {
        let prefix = name_prefix(&definition.name);
        if !buckets.contains_key(&prefix) {
            bucket_order.push(prefix.clone());
        }
        buckets.entry(prefix).or_default().push(definition);
    }

    let mut optimized_tools = Vec::new();
    let mut fusion_mapping = HashMap::new();
    let mut merged_total = 0usize;
    let mut merged_read_only = 0usize;
    let mut token_reduction = 0u64;

    for prefix in &bucket_order {
        let members = &buckets[prefix];
        if members.len() < 2 {
            optimized_tools.push(members[0].clone());
            continue;
        }

        let fused = fuse_definitions(members);
        let names: Vec<String> = members.iter().map(|d| d.name.clone()).collect();

        merged_total += members.len();
        merged_read_only += members
            .iter()
            .filter(|d| !is_write_name(&d.name))
            .count();
        token_reduction += DEFINITION_OVERHEAD_TOKENS * (members.len() as u64 - 1);

        fusion_mapping.insert(fused.name.clone(), names);
        optimized_tools.push(fused);
    }

    let parallelism_gain = if merged_total == 0 {
        0.0
    } else {
        merged_read_only as f64 / merged_total as f64
    };

    fuse_compile!(debug,
        original = definitions.len(),
        optimized = optimized_tools.len(),
        token_reduction = token_reduction,
        "Tool definitions optimized"
    );

    DefinitionOptimization {
        optimized_tools,
        fusion_mapping,
        estimated_savings: DefinitionSavings {
            token_reduction,
            parallelism_gain,
        },
    }
}

fn name_prefix(name: &str) -> String {
    name.split('_').next().unwrap_or(name).to_lowercase()
}

fn is_write_name(name: &str) -> bool {
    let name = name.to_lowercase();
    WRITE_VERBS.iter().any(|verb| name.contains(verb))
}

/// Builds the synthetic combined entry for one bucket.
fn fuse_definitions(members: &[&ToolDefinition]) -> ToolDefinition {
    let names: Vec<&str> = members.iter().map(|d| d.name.as_str()).collect();
    let fused_name = format!("fused_{}", names.join("_"));
    let description = format!(
        "Combined schema for {}. Select a member via `operation`.",
        names.join(", ")
    );

    let schemas: Vec<serde_json::Value> = members
        .iter()
        .map(|d| {
            if d.parameters.is_null() {
                json!({ "type": "object" })
            } else {
                d.parameters.clone()
            }
        })
        .collect();

    let parameters = json!({
        "type": "object",
        "properties": {
            "operation": {
                "type": "string",
                "enum": names,
            },
            "arguments": {
                "oneOf": schemas,
            },
        },
        "required": ["operation"],
    });

    ToolDefinition::new(fused_name, description).with_parameters(parameters)
}
