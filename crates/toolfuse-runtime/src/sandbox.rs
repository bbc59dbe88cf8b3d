//! Sandboxed executor wrapper.
//!
//! Dynamic or user-defined tools run behind the same [`ToolExecutor`]
//! contract as everything else; this wrapper adds the policy checks a host
//! wants around them (a tool allowlist, an argument size ceiling, and a
//! per-call timeout) so the engine stays agnostic to what an operation
//! actually is.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use toolfuse_core::error::ExecutionError;
use toolfuse_core::fuse_op;
use toolfuse_core::traits::ToolExecutor;
use toolfuse_core::types::{JsonMap, JsonValue};

/// Policy applied to every call through a [`SandboxedExecutor`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SandboxPolicy {
    /// Tools permitted to run; `None` permits everything.
    #[serde(default)]
    pub allowed_tools: Option<HashSet<String>>,

    /// Maximum serialized argument size in bytes.
    ///
    /// Default: 65536
    #[serde(default = "default_max_argument_bytes")]
    pub max_argument_bytes: usize,

    /// Per-call time budget in milliseconds.
    ///
    /// Default: 30000ms (30 seconds)
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            allowed_tools: None,
            max_argument_bytes: default_max_argument_bytes(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl SandboxPolicy {
    /// Create a policy with default limits and no allowlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict execution to the named tools.
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    /// Set the argument size ceiling.
    pub fn with_max_argument_bytes(mut self, max_argument_bytes: usize) -> Self {
        self.max_argument_bytes = max_argument_bytes;
        self
    }

    /// Set the per-call time budget.
    pub fn with_call_timeout_ms(mut self, call_timeout_ms: u64) -> Self {
        self.call_timeout_ms = call_timeout_ms;
        self
    }
}

// Default functions for serde
fn default_max_argument_bytes() -> usize {
    64 * 1024
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

/// Wraps any executor with a [`SandboxPolicy`].
pub struct SandboxedExecutor {
    inner: Arc<dyn ToolExecutor>,
    policy: SandboxPolicy,
}

impl SandboxedExecutor {
    /// Wraps an executor with the given policy.
    pub fn new(inner: Arc<dyn ToolExecutor>, policy: SandboxPolicy) -> Self {
        SandboxedExecutor { inner, policy }
    }

    /// The active policy.
    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }
}

#[async_trait]
impl ToolExecutor for SandboxedExecutor {
    async fn execute(
        &self,
        name: &str,
        arguments: &JsonMap,
    ) -> Result<JsonValue, ExecutionError> {
        if let Some(allowed) = &self.policy.allowed_tools {
            if !allowed.contains(name) {
                fuse_op!(warn, tool = %name, "Sandbox rejected tool");
                return Err(ExecutionError::NotPermitted(name.to_string()));
            }
        }

        let argument_bytes = serde_json::to_vec(arguments)
            .map_err(|e| ExecutionError::InvalidInput(e.to_string()))?
            .len();
        if argument_bytes > self.policy.max_argument_bytes {
            return Err(ExecutionError::InvalidInput(format!(
                "arguments exceed {} bytes",
                self.policy.max_argument_bytes
            )));
        }

        let budget = Duration::from_millis(self.policy.call_timeout_ms);
        match tokio::time::timeout(budget, self.inner.execute(name, arguments)).await {
            Ok(result) => result,
            Err(_) => {
                fuse_op!(warn, tool = %name, timeout_ms = self.policy.call_timeout_ms, "Sandboxed call timed out");
                Err(ExecutionError::Timeout(budget))
            }
        }
    }
}
