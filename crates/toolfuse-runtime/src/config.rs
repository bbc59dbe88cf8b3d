//! Execution engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the execution engine.
///
/// Controls stage parallelism and the failure policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of operations in flight within a ready stage.
    ///
    /// 1 means strictly sequential execution.
    ///
    /// Default: 1
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// When true, later stages still run after an operation fails; when
    /// false, no further stage is dispatched after the first failure
    /// (in-flight operations are awaited to completion).
    ///
    /// Default: false
    #[serde(default)]
    pub continue_on_error: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            continue_on_error: false,
        }
    }
}

impl ExecutorConfig {
    /// Create a new executor configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum stage parallelism.
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    /// Set the failure policy.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_parallelism == 0 {
            return Err("max_parallelism must be > 0".to_string());
        }
        Ok(())
    }
}

// Default functions for serde
fn default_max_parallelism() -> usize {
    1
}
