//! Planned tool invocations.
//!
//! A [`ToolInvocation`] is one planned operation in a batch: a caller-assigned
//! id, the tool name, an ordered opaque argument mapping, and a cost estimate
//! for executing it standalone. Invocations are immutable once submitted and
//! live for a single compilation pass.

use serde::{Deserialize, Serialize};

/// Opaque argument payload for a single parameter value.
pub type JsonValue = serde_json::Value;

/// Ordered mapping of parameter name to value.
///
/// Insertion order is preserved (serde_json `preserve_order`), so the
/// compiler sees arguments exactly as the planner emitted them.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Returns `true` when a `u64` is zero (used by `skip_serializing_if`).
fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Represents one planned tool operation.
///
/// Serialization is tuned for compact, readable JSON: empty arguments and a
/// zero cost estimate are omitted, and missing fields fall back to their
/// defaults on deserialization.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    /// Caller-assigned identifier, unique within a batch.
    pub id: String,
    /// Operation identifier (the tool name).
    pub name: String,
    /// Arguments for the operation, opaque to the compiler.
    /// Omitted from serialization when empty.
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub arguments: JsonMap,
    /// Estimated cost of executing this invocation standalone.
    /// Omitted from serialization when zero (the default).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub estimated_cost: u64,
}

impl ToolInvocation {
    /// Creates a new invocation with no arguments and zero estimated cost.
    ///
    /// # Examples
    ///
    /// ```
    /// use toolfuse_core::types::ToolInvocation;
    ///
    /// let inv = ToolInvocation::new("1", "read");
    /// assert_eq!(inv.id, "1");
    /// assert_eq!(inv.name, "read");
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        ToolInvocation {
            id: id.into(),
            name: name.into(),
            arguments: JsonMap::new(),
            estimated_cost: 0,
        }
    }

    /// Adds an argument, preserving insertion order.
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Sets the standalone cost estimate.
    pub fn with_estimated_cost(mut self, estimated_cost: u64) -> Self {
        self.estimated_cost = estimated_cost;
        self
    }

    /// Gets an argument value by parameter name.
    pub fn argument(&self, key: &str) -> Option<&JsonValue> {
        self.arguments.get(key)
    }
}
