//! Integration adapters.
//!
//! Thin functions mapping a flat invocation list (single agent) or a
//! per-member map of invocation lists (a team) onto the fusion compiler,
//! returning per-entity compiled plans plus the fusion recommendation.

use std::collections::HashMap;

use toolfuse_core::fuse_compile;
use toolfuse_core::types::{CompilationResult, ToolInvocation};

use crate::fusion::{FusionCompiler, FusionConfig};

/// A compiled plan plus the fusion recommendation for one agent.
#[derive(Clone, Debug)]
pub struct SingleAgentIntegration {
    /// The compiled plan.
    pub compiled: CompilationResult,
    /// True when fusing this batch is worth recommending.
    pub should_use_fusion: bool,
}

/// Pure threshold comparison deciding whether fusion pays off.
///
/// A batch with no multi-member group never recommends fusion, whatever
/// the threshold: there is nothing to fuse.
pub fn should_use_fusion(result: &CompilationResult, config: &FusionConfig) -> bool {
    let has_fusable_group = result
        .fused_operations
        .iter()
        .any(|f| f.member_count() >= 2);
    has_fusable_group && result.total_token_savings >= config.min_token_savings_threshold
}

/// Compiles one agent's batch and attaches the fusion recommendation.
pub fn integrate_with_single_agent(
    invocations: &[ToolInvocation],
    config: &FusionConfig,
) -> SingleAgentIntegration {
    let compiled = FusionCompiler::new().compile(invocations, config);
    let recommend = should_use_fusion(&compiled, config);

    fuse_compile!(debug,
        invocations = invocations.len(),
        savings = compiled.total_token_savings,
        should_use_fusion = recommend,
        "Single-agent integration compiled"
    );

    SingleAgentIntegration {
        compiled,
        should_use_fusion: recommend,
    }
}

/// Compiles a plan per team member, skipping members with nothing to do.
pub fn integrate_with_team(
    member_invocations: &HashMap<String, Vec<ToolInvocation>>,
    config: &FusionConfig,
) -> HashMap<String, CompilationResult> {
    let compiler = FusionCompiler::new();

    member_invocations
        .iter()
        .filter(|(_, invocations)| !invocations.is_empty())
        .map(|(member, invocations)| (member.clone(), compiler.compile(invocations, config)))
        .collect()
}
