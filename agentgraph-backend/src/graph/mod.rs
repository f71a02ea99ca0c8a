//! Declarative agent graph: named nodes and directed, templated edges.
//!
//! The graph is a pure data container; traversal lives in [`task`]. Edges
//! from the reserved [`ENTRY_NODE_ID`] pseudo-node form a task's starting
//! frontier. Node references are resolved lazily at traversal time, so a
//! dangling `to` only fails when the walk reaches it.

pub mod task;

pub use task::{GraphTask, ProgressEvent};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::agent::GraphNode;
use crate::error::EngineError;

/// Reserved id of the entry pseudo-node.
pub const ENTRY_NODE_ID: &str = "ROOTNODE";

/// A directed, templated transition between two nodes.
///
/// `(from, to)` is the edge's identity: re-adding an existing pair replaces
/// the earlier edge in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Prompt template with `^id^` memory references.
    pub prompt: String,
    /// Memory id the target agent stores its output under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
    /// Intent labels that let this edge fire after a classifier node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents: Option<Vec<String>>,
    /// Side-effect handler names fired on the target agent's output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Vec<String>>,
}

impl Edge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Edge {
            from: from.into(),
            to: to.into(),
            prompt: prompt.into(),
            result_key: None,
            intents: None,
            handlers: None,
        }
    }

    /// An edge out of the entry pseudo-node.
    pub fn entry(to: impl Into<String>, prompt: impl Into<String>) -> Self {
        Edge::new(ENTRY_NODE_ID, to, prompt)
    }

    pub fn with_result_key(mut self, key: impl Into<String>) -> Self {
        self.result_key = Some(key.into());
        self
    }

    pub fn with_intents<I, S>(mut self, intents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intents = Some(intents.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_handlers<I, S>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handlers = Some(handlers.into_iter().map(Into::into).collect());
        self
    }

    /// Whether this edge fires for the given intent label.
    pub fn accepts_intent(&self, intent: &str) -> bool {
        self.intents
            .as_ref()
            .is_some_and(|labels| labels.iter().any(|l| l == intent))
    }
}

/// The node/edge container.
#[derive(Default)]
pub struct Graph {
    nodes: HashMap<String, GraphNode>,
    /// Outgoing edges per node, in declaration order.
    edges: HashMap<String, Vec<Edge>>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("edges", &self.edges)
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a node id to an agent. Re-binding an id overwrites silently.
    pub fn add_node(&mut self, node_id: impl Into<String>, node: GraphNode) {
        self.nodes.insert(node_id.into(), node);
    }

    /// Add an edge. An existing `(from, to)` pair is replaced in place so
    /// sibling declaration order is preserved.
    pub fn add_edge(&mut self, edge: Edge) {
        let outgoing = self.edges.entry(edge.from.clone()).or_default();
        match outgoing.iter_mut().find(|e| e.to == edge.to) {
            Some(existing) => *existing = edge,
            None => outgoing.push(edge),
        }
    }

    /// Register (or overwrite) the entry edge for a node.
    pub fn set_entry_point(
        &mut self,
        node_id: impl Into<String>,
        prompt: impl Into<String>,
        result_key: Option<String>,
        intents: Option<Vec<String>>,
    ) {
        let mut edge = Edge::entry(node_id, prompt);
        edge.result_key = result_key;
        edge.intents = intents;
        self.add_edge(edge);
    }

    /// The task's starting frontier. Fails when no entry edge was set.
    pub fn entry_edges(&self) -> Result<Vec<Edge>, EngineError> {
        let edges = self.outgoing_edges(ENTRY_NODE_ID);
        if edges.is_empty() {
            return Err(EngineError::Configuration(
                "entry point not set".to_string(),
            ));
        }
        Ok(edges)
    }

    /// Outgoing edges of a node in declaration order; empty for leaves.
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<Edge> {
        self.edges.get(node_id).cloned().unwrap_or_default()
    }

    /// Resolve a node id. Missing ids are a fatal lookup error.
    pub fn node(&self, node_id: &str) -> Result<&GraphNode, EngineError> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| EngineError::node_not_found(node_id))
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges
            .get(from)
            .and_then(|outgoing| outgoing.iter().find(|e| e.to == to))
    }
}
