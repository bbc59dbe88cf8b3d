//! Execution engine - runs a compiled plan against a tool executor.
//!
//! Scheduling is a level-order topological walk of the plan's dependency
//! graph: each iteration collects the invocations with no unresolved
//! dependency (a ready stage), dispatches them concurrently up to the
//! configured parallelism, and awaits the stage before computing the next
//! one. Operations beyond the cap queue on the concurrency controller until
//! a slot frees.
//!
//! When the compiler flagged circular dependencies, the residue that never
//! becomes ready is executed in original submission order as one final
//! stage. That tie-break is deterministic, so the engine never deadlocks
//! and never drops work.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinSet;

use toolfuse_core::error::{ExecutionError, RuntimeError};
use toolfuse_core::traits::ToolExecutor;
use toolfuse_core::types::{
    CompilationResult, ExecutionResult, JsonValue, OpStatus, OperationOutcome, ToolInvocation,
};
use toolfuse_core::{fuse_op, fuse_sched};

use crate::concurrency::ConcurrencyControl;
use crate::config::ExecutorConfig;
use crate::RuntimeResult;

/// What one dispatched operation reports back to the scheduler.
type StageReport = (usize, Result<JsonValue, ExecutionError>, u128, u128);

/// Executes compiled plans with bounded parallelism and partial-failure
/// semantics.
pub struct ExecutionEngine {
    config: ExecutorConfig,
}

impl ExecutionEngine {
    /// Create a new execution engine with the given configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a compiled plan to completion.
    ///
    /// Per-operation failures never propagate as errors: they are recorded
    /// in that operation's outcome and summarized in `error_summary`, with
    /// scope governed by `continue_on_error`. The only `Err` this returns
    /// is an invalid configuration.
    pub async fn execute(
        &self,
        compilation: &CompilationResult,
        executor: Arc<dyn ToolExecutor>,
    ) -> RuntimeResult<ExecutionResult> {
        self.config
            .validate()
            .map_err(|message| RuntimeError::InvalidConfig { message })?;

        let start = Instant::now();
        let execution_id = uuid::Uuid::now_v7().to_string();
        let invocations = &compilation.invocations;
        let total = invocations.len();

        fuse_sched!(info,
            execution_id = %execution_id,
            invocations = total,
            max_parallelism = self.config.max_parallelism,
            continue_on_error = self.config.continue_on_error,
            "Starting plan execution"
        );

        let outcomes: Arc<DashMap<String, OperationOutcome>> = Arc::new(DashMap::new());
        for invocation in invocations {
            outcomes.insert(
                invocation.id.clone(),
                OperationOutcome::pending(&invocation.id),
            );
        }

        if total == 0 {
            return Ok(ExecutionResult {
                execution_id,
                success: true,
                total_execution_time_ms: start.elapsed().as_millis(),
                error_summary: String::new(),
                outcomes: HashMap::new(),
            });
        }

        let (mut in_degree, dependents) = materialize_schedule_state(compilation);

        let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let concurrency = Arc::new(ConcurrencyControl::new(self.config.max_parallelism));

        let mut finished = vec![false; total];
        let mut remaining = total;
        let mut failed_count = 0usize;
        let mut abort = false;
        let mut fallback_used = false;

        let mut ready: Vec<usize> = (0..total).filter(|&i| in_degree[i] == 0).collect();

        while remaining > 0 && !abort {
            if ready.is_empty() {
                // Unreachable work remains: the compiler flagged a cycle (or
                // handed over a malformed graph). Break it deterministically
                // by running the residue in submission order as one stage.
                if fallback_used {
                    break;
                }
                fallback_used = true;
                ready = (0..total).filter(|&i| !finished[i]).collect();
                fuse_sched!(warn,
                    execution_id = %execution_id,
                    residue = ready.len(),
                    "Dependency residue detected; executing in submission order"
                );
            }

            let stage: Vec<usize> = std::mem::take(&mut ready);
            fuse_sched!(debug,
                execution_id = %execution_id,
                stage_size = stage.len(),
                "Dispatching ready stage"
            );

            let mut unreported: BTreeSet<usize> = stage.iter().copied().collect();
            let mut join_set: JoinSet<StageReport> = JoinSet::new();

            for &idx in &stage {
                join_set.spawn(dispatch_one(
                    idx,
                    invocations[idx].clone(),
                    Arc::clone(&executor),
                    Arc::clone(&outcomes),
                    Arc::clone(&concurrency),
                    start,
                ));
            }

            let mut newly_ready: Vec<usize> = Vec::new();

            while let Some(joined) = join_set.join_next().await {
                let (idx, result, started_at_ms, finished_at_ms) = match joined {
                    Ok(report) => report,
                    Err(join_error) => {
                        // A panicking executor callback aborts its task; the
                        // invocation is settled from `unreported` below.
                        fuse_sched!(error, error = %join_error, "Operation task aborted");
                        continue;
                    }
                };
                unreported.remove(&idx);

                let invocation = &invocations[idx];
                let failed = settle_outcome(
                    &outcomes,
                    &errors,
                    invocation,
                    result,
                    started_at_ms,
                    finished_at_ms,
                );
                if failed {
                    failed_count += 1;
                    if !self.config.continue_on_error {
                        abort = true;
                    }
                }

                finished[idx] = true;
                remaining -= 1;
                release_dependents(idx, &dependents, &mut in_degree, &finished, &mut newly_ready);
            }

            // Stage members that never reported lost their task to a panic;
            // settle them as failed so the bookkeeping stays total.
            for idx in unreported {
                let invocation = &invocations[idx];
                if let Some(mut outcome) = outcomes.get_mut(&invocation.id) {
                    outcome.status = OpStatus::Failed;
                    outcome.error = Some("operation task aborted".to_string());
                }
                errors.lock().push(format!(
                    "{} ({}): operation task aborted",
                    invocation.name, invocation.id
                ));
                failed_count += 1;
                if !self.config.continue_on_error {
                    abort = true;
                }
                finished[idx] = true;
                remaining -= 1;
                release_dependents(idx, &dependents, &mut in_degree, &finished, &mut newly_ready);
            }

            newly_ready.sort_unstable();
            ready = newly_ready;
        }

        // Anything left unfinished was cut off by fail-fast.
        for (idx, invocation) in invocations.iter().enumerate() {
            if !finished[idx] {
                if let Some(mut outcome) = outcomes.get_mut(&invocation.id) {
                    outcome.status = OpStatus::Skipped;
                }
            }
        }

        let error_summary = errors.lock().join("; ");
        let success = failed_count == 0 && remaining == 0;
        let total_execution_time_ms = start.elapsed().as_millis();

        fuse_sched!(info,
            execution_id = %execution_id,
            duration_ms = total_execution_time_ms,
            failed = failed_count,
            skipped = remaining,
            "Plan execution completed"
        );

        Ok(ExecutionResult {
            execution_id,
            success,
            total_execution_time_ms,
            error_summary,
            outcomes: outcomes
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        })
    }
}

/// Builds in-degree counters and a dependents adjacency from the plan.
///
/// Edge endpoints missing from the batch are ignored: a compile-side fault
/// has already been flagged via `success = false`, and the engine's job is
/// to stay total.
fn materialize_schedule_state(compilation: &CompilationResult) -> (Vec<usize>, Vec<Vec<usize>>) {
    let invocations = &compilation.invocations;
    let index_of: HashMap<&str, usize> = invocations
        .iter()
        .enumerate()
        .map(|(i, inv)| (inv.id.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; invocations.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); invocations.len()];

    for (i, invocation) in invocations.iter().enumerate() {
        let Some(deps) = compilation.dependency_graph.dependencies_of(&invocation.id) else {
            continue;
        };
        for dep in deps {
            if let Some(&j) = index_of.get(dep.as_str()) {
                if j != i {
                    in_degree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }
    }

    (in_degree, dependents)
}

/// Runs one invocation behind a concurrency permit and reports the result.
async fn dispatch_one(
    idx: usize,
    invocation: ToolInvocation,
    executor: Arc<dyn ToolExecutor>,
    outcomes: Arc<DashMap<String, OperationOutcome>>,
    concurrency: Arc<ConcurrencyControl>,
    start: Instant,
) -> StageReport {
    // Tokio's semaphore queues fairly, so contended operations start in
    // the order they were dispatched.
    let permit = match concurrency.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            let now = start.elapsed().as_millis();
            return (
                idx,
                Err(ExecutionError::Failed("execution cancelled".to_string())),
                now,
                now,
            );
        }
    };

    let started_at_ms = start.elapsed().as_millis();
    if let Some(mut outcome) = outcomes.get_mut(&invocation.id) {
        outcome.status = OpStatus::Running;
        outcome.started_at_ms = Some(started_at_ms);
    }

    fuse_op!(debug,
        invocation = %invocation.id,
        tool = %invocation.name,
        "Dispatching operation"
    );

    let result = executor.execute(&invocation.name, &invocation.arguments).await;
    let finished_at_ms = start.elapsed().as_millis();
    drop(permit);

    (idx, result, started_at_ms, finished_at_ms)
}

/// Writes one operation's terminal outcome; returns true when it failed.
fn settle_outcome(
    outcomes: &DashMap<String, OperationOutcome>,
    errors: &Mutex<Vec<String>>,
    invocation: &ToolInvocation,
    result: Result<JsonValue, ExecutionError>,
    started_at_ms: u128,
    finished_at_ms: u128,
) -> bool {
    let duration_ms = finished_at_ms.saturating_sub(started_at_ms);

    match result {
        Ok(value) => {
            if let Some(mut outcome) = outcomes.get_mut(&invocation.id) {
                outcome.status = OpStatus::Completed;
                outcome.result = Some(value);
                outcome.started_at_ms = Some(started_at_ms);
                outcome.finished_at_ms = Some(finished_at_ms);
                outcome.duration_ms = Some(duration_ms);
            }
            fuse_op!(debug,
                invocation = %invocation.id,
                duration_ms = duration_ms,
                "Operation completed"
            );
            false
        }
        Err(error) => {
            if let Some(mut outcome) = outcomes.get_mut(&invocation.id) {
                outcome.status = OpStatus::Failed;
                outcome.error = Some(error.to_string());
                outcome.started_at_ms = Some(started_at_ms);
                outcome.finished_at_ms = Some(finished_at_ms);
                outcome.duration_ms = Some(duration_ms);
            }
            errors.lock().push(format!(
                "{} ({}): {}",
                invocation.name, invocation.id, error
            ));
            fuse_op!(error,
                invocation = %invocation.id,
                error = %error,
                "Operation failed"
            );
            true
        }
    }
}

/// Decrements dependents' in-degrees after a completion, collecting any
/// that became ready.
fn release_dependents(
    idx: usize,
    dependents: &[Vec<usize>],
    in_degree: &mut [usize],
    finished: &[bool],
    newly_ready: &mut Vec<usize>,
) {
    for &dep in &dependents[idx] {
        in_degree[dep] = in_degree[dep].saturating_sub(1);
        if in_degree[dep] == 0 && !finished[dep] {
            newly_ready.push(dep);
        }
    }
}
