//! Execution outcomes.
//!
//! Types for tracking the status of operations while a compiled plan runs,
//! and the aggregate result handed back to the caller.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Operation execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpStatus {
    /// Operation is waiting for dependencies.
    Pending,
    /// Operation is currently executing.
    Running,
    /// Operation completed successfully.
    Completed,
    /// Operation failed.
    Failed,
    /// Operation was never attempted because an earlier failure aborted the
    /// schedule.
    Skipped,
}

/// Status record for a single invocation.
///
/// Timestamps are offsets in milliseconds from the start of the execution,
/// so downstream ordering assertions need no shared clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcome {
    /// Invocation identifier.
    pub invocation_id: String,
    /// Current execution status.
    pub status: OpStatus,
    /// Value returned by the executor (if completed).
    pub result: Option<serde_json::Value>,
    /// Failure message (if failed).
    pub error: Option<String>,
    /// Time when execution started (milliseconds since execution start).
    pub started_at_ms: Option<u128>,
    /// Time when execution finished (milliseconds since execution start).
    pub finished_at_ms: Option<u128>,
    /// Total execution duration in milliseconds.
    pub duration_ms: Option<u128>,
}

impl OperationOutcome {
    /// Creates a pending outcome for an invocation.
    pub fn pending(invocation_id: impl Into<String>) -> Self {
        OperationOutcome {
            invocation_id: invocation_id.into(),
            status: OpStatus::Pending,
            result: None,
            error: None,
            started_at_ms: None,
            finished_at_ms: None,
            duration_ms: None,
        }
    }
}

/// Aggregate result of executing a compiled plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    /// Unique identifier for this execution.
    pub execution_id: String,
    /// True iff zero operations failed.
    pub success: bool,
    /// End-to-end wall-clock duration, not the per-operation sum.
    pub total_execution_time_ms: u128,
    /// Concatenated failure messages, empty when none.
    pub error_summary: String,
    /// Per-operation outcomes keyed by invocation id.
    pub outcomes: HashMap<String, OperationOutcome>,
}

impl ExecutionResult {
    /// Looks up one operation's outcome by invocation id.
    pub fn outcome(&self, invocation_id: &str) -> Option<&OperationOutcome> {
        self.outcomes.get(invocation_id)
    }

    /// Number of operations that completed successfully.
    pub fn completed_count(&self) -> usize {
        self.count_status(OpStatus::Completed)
    }

    /// Number of operations that failed.
    pub fn failed_count(&self) -> usize {
        self.count_status(OpStatus::Failed)
    }

    /// Number of operations that were never attempted.
    pub fn skipped_count(&self) -> usize {
        self.count_status(OpStatus::Skipped)
    }

    fn count_status(&self, status: OpStatus) -> usize {
        self.outcomes
            .values()
            .filter(|o| o.status == status)
            .count()
    }
}
