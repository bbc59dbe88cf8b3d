//! Dependency graph over a batch of invocations.
//!
//! The graph maps each invocation id to the set of ids it must wait for.
//! It is built once per compilation in submission order and never mutated
//! afterwards. Cycle detection reports rather than fails: even a malformed
//! graph keeps entries for every node so the scheduler can break the cycle
//! deterministically instead of deadlocking or dropping work.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Must-happen-before relationships between invocations.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencyGraph {
    /// Node ids in submission order.
    nodes: Vec<String>,
    /// Maps an invocation id to the ids it must wait for.
    edges: HashMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        DependencyGraph {
            nodes: Vec::new(),
            edges: HashMap::new(),
        }
    }

    /// Registers a node, keeping submission order. Duplicate ids are ignored.
    pub fn add_node(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.edges.contains_key(&id) {
            self.edges.insert(id.clone(), BTreeSet::new());
            self.nodes.push(id);
        }
    }

    /// Records that `dependent` must wait for `dependency`.
    ///
    /// Both endpoints are registered as nodes if not already present.
    /// Self-edges are ignored.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        if dependent == dependency {
            return;
        }
        self.add_node(dependent);
        self.add_node(dependency);
        if let Some(deps) = self.edges.get_mut(dependent) {
            deps.insert(dependency.to_string());
        }
    }

    /// Checks whether the graph contains a node.
    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Node ids in submission order.
    pub fn node_ids(&self) -> &[String] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// The ids an invocation must wait for, if it is known.
    pub fn dependencies_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(id)
    }

    /// The ids that wait for an invocation.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| {
                self.edges
                    .get(n.as_str())
                    .is_some_and(|deps| deps.contains(id))
            })
            .map(String::as_str)
            .collect()
    }

    /// True when `dependent` waits for `dependency` (directly).
    pub fn depends_on(&self, dependent: &str, dependency: &str) -> bool {
        self.edges
            .get(dependent)
            .is_some_and(|deps| deps.contains(dependency))
    }

    /// True when two invocations are connected by an edge in either direction.
    pub fn linked(&self, a: &str, b: &str) -> bool {
        self.depends_on(a, b) || self.depends_on(b, a)
    }

    /// Checks if the graph contains cycles.
    ///
    /// Uses depth-first search with recursion-stack marking. A malformed
    /// graph is reported, never raised.
    pub fn detect_cycles(&self) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut in_stack: HashSet<&str> = HashSet::new();

        for node in &self.nodes {
            if !visited.contains(node.as_str())
                && self.visit_detects_cycle(node, &mut visited, &mut in_stack)
            {
                return true;
            }
        }
        false
    }

    fn visit_detects_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        in_stack: &mut HashSet<&'a str>,
    ) -> bool {
        visited.insert(node);
        in_stack.insert(node);

        if let Some(deps) = self.edges.get(node) {
            for dep in deps {
                if in_stack.contains(dep.as_str()) {
                    return true;
                }
                if !visited.contains(dep.as_str())
                    && self.visit_detects_cycle(dep, visited, in_stack)
                {
                    return true;
                }
            }
        }

        in_stack.remove(node);
        false
    }

    /// Length in edges of the longest dependency chain.
    ///
    /// Cycle tolerant: a back edge contributes nothing, so the computation
    /// terminates on malformed graphs.
    pub fn max_depth(&self) -> usize {
        let mut memo: HashMap<&str, usize> = HashMap::new();
        let mut in_stack: HashSet<&str> = HashSet::new();

        self.nodes
            .iter()
            .map(|n| self.depth_of(n, &mut memo, &mut in_stack))
            .max()
            .unwrap_or(0)
    }

    fn depth_of<'a>(
        &'a self,
        node: &'a str,
        memo: &mut HashMap<&'a str, usize>,
        in_stack: &mut HashSet<&'a str>,
    ) -> usize {
        if let Some(&depth) = memo.get(node) {
            return depth;
        }
        if !in_stack.insert(node) {
            return 0;
        }

        let depth = self
            .edges
            .get(node)
            .map(|deps| {
                deps.iter()
                    .map(|dep| 1 + self.depth_of(dep, memo, in_stack))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);

        in_stack.remove(node);
        memo.insert(node, depth);
        depth
    }

    /// Mean number of dependencies per node (mean in-degree).
    pub fn mean_in_degree(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        self.edge_count() as f64 / self.nodes.len() as f64
    }
}
