//! Static tool schema entries.
//!
//! A [`ToolDefinition`] is the schema advertised to a model for one tool.
//! The definition optimizer merges related entries into synthetic combined
//! schemas to shrink the definition payload; the schemas themselves stay
//! opaque JSON.

use serde::{Deserialize, Serialize};

/// One advertised tool schema.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Parameter schema (JSON Schema, opaque).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Creates a definition with a null parameter schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        ToolDefinition {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::Value::Null,
        }
    }

    /// Sets the parameter schema.
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let def = ToolDefinition::new("read_file", "Read a file").with_parameters(json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        }));

        assert_eq!(def.name, "read_file");
        assert_eq!(def.parameters["required"][0], "path");
    }

    #[test]
    fn test_null_parameters_are_omitted() {
        let def = ToolDefinition::new("noop", "Does nothing");
        let json = serde_json::to_string(&def).expect("serialize");
        assert!(!json.contains("parameters"));

        let restored: ToolDefinition = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(def, restored);
    }
}
