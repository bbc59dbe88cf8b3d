//! Dependency analysis over a batch of invocations.
//!
//! The analyzer infers which resource each invocation touches and whether it
//! reads or writes it, then derives read-after-write, write-after-read, and
//! write-after-write edges in submission order. Resource inference is a
//! pluggable capability; the default is a naming heuristic over argument
//! names and operation-name verbs.

use std::collections::HashMap;
use std::sync::Arc;

use toolfuse_core::fuse_dag;
use toolfuse_core::types::{DependencyGraph, ToolInvocation};

/// Whether an invocation reads or mutates the resource it touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// The invocation only observes the resource.
    Read,
    /// The invocation mutates the resource.
    Write,
}

/// A resource key plus the access mode inferred for one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceAccess {
    /// Identifies the resource (e.g. a file path).
    pub key: String,
    /// Read or write.
    pub mode: AccessMode,
}

impl ResourceAccess {
    /// Creates a read access.
    pub fn read(key: impl Into<String>) -> Self {
        ResourceAccess {
            key: key.into(),
            mode: AccessMode::Read,
        }
    }

    /// Creates a write access.
    pub fn write(key: impl Into<String>) -> Self {
        ResourceAccess {
            key: key.into(),
            mode: AccessMode::Write,
        }
    }
}

/// Infers the resource an invocation touches.
///
/// Callers can override the default naming heuristic per tool family by
/// installing their own extractor on the [`DependencyAnalyzer`].
pub trait ResourceKeyExtractor: Send + Sync {
    /// Returns the resource access for an invocation, or `None` when the
    /// invocation touches nothing inferable (an isolated node).
    fn extract(&self, invocation: &ToolInvocation) -> Option<ResourceAccess>;
}

/// Argument names that identify a resource key, in priority order.
const RESOURCE_ARGUMENTS: &[&str] = &[
    "path",
    "file",
    "filename",
    "file_path",
    "filepath",
    "target",
    "dest",
    "destination",
    "key",
    "url",
];

/// Operation-name fragments that mark an invocation as a write.
const WRITE_VERBS: &[&str] = &[
    "write", "create", "delete", "update", "remove", "append", "edit", "move", "put", "set",
];

/// Default extractor: argument names identify the resource, operation-name
/// verbs decide read vs. write.
#[derive(Clone, Copy, Debug, Default)]
pub struct NamingHeuristicExtractor;

impl NamingHeuristicExtractor {
    /// Creates the default heuristic extractor.
    pub fn new() -> Self {
        NamingHeuristicExtractor
    }

    fn resource_key(invocation: &ToolInvocation) -> Option<String> {
        // First matching argument in the invocation's own order wins, so
        // "path" beats "dest" only if the caller put it first.
        invocation
            .arguments
            .iter()
            .find(|(name, _)| RESOURCE_ARGUMENTS.contains(&name.to_lowercase().as_str()))
            .map(|(_, value)| match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            })
    }

    fn is_write(name: &str) -> bool {
        let name = name.to_lowercase();
        WRITE_VERBS.iter().any(|verb| name.contains(verb))
    }
}

impl ResourceKeyExtractor for NamingHeuristicExtractor {
    fn extract(&self, invocation: &ToolInvocation) -> Option<ResourceAccess> {
        let key = Self::resource_key(invocation)?;
        let mode = if Self::is_write(&invocation.name) {
            AccessMode::Write
        } else {
            AccessMode::Read
        };
        Some(ResourceAccess { key, mode })
    }
}

/// Per-resource bookkeeping while scanning the batch.
#[derive(Default)]
struct ResourceState {
    /// Most recent writer of the resource.
    last_writer: Option<String>,
    /// Readers since that writer.
    readers: Vec<String>,
}

/// Builds a [`DependencyGraph`] from inferred resource conflicts.
pub struct DependencyAnalyzer {
    extractor: Arc<dyn ResourceKeyExtractor>,
}

impl DependencyAnalyzer {
    /// Creates an analyzer with the default naming heuristic.
    pub fn new() -> Self {
        DependencyAnalyzer {
            extractor: Arc::new(NamingHeuristicExtractor::new()),
        }
    }

    /// Creates an analyzer with a caller-supplied extractor.
    pub fn with_extractor(extractor: Arc<dyn ResourceKeyExtractor>) -> Self {
        DependencyAnalyzer { extractor }
    }

    /// Builds the dependency graph for a batch, in submission order.
    ///
    /// Total for any input: invocations with no inferable resource become
    /// isolated nodes, and malformed shapes are reported through the graph's
    /// own cycle detection rather than raised here.
    pub fn analyze(&self, invocations: &[ToolInvocation]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let mut resources: HashMap<String, ResourceState> = HashMap::new();

        for invocation in invocations {
            graph.add_node(invocation.id.as_str());

            let Some(access) = self.extractor.extract(invocation) else {
                continue;
            };

            let state = resources.entry(access.key.clone()).or_default();
            match access.mode {
                AccessMode::Read => {
                    // Read-after-write: wait for the last writer, if any.
                    if let Some(writer) = &state.last_writer {
                        graph.add_dependency(&invocation.id, writer);
                    }
                    state.readers.push(invocation.id.clone());
                }
                AccessMode::Write => {
                    // Write-after-read and write-after-write, then the
                    // reader set resets and the writer pointer moves.
                    for reader in state.readers.drain(..) {
                        graph.add_dependency(&invocation.id, &reader);
                    }
                    if let Some(writer) = state.last_writer.take() {
                        graph.add_dependency(&invocation.id, &writer);
                    }
                    state.last_writer = Some(invocation.id.clone());
                }
            }
        }

        fuse_dag!(debug,
            nodes = graph.len(),
            edges = graph.edge_count(),
            resources = resources.len(),
            "Dependency graph built"
        );

        graph
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
