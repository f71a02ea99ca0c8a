use std::sync::Arc;

use super::Agent;
use crate::error::EngineError;
use crate::graph::Edge;
use crate::intent::IntentClassifier;
use crate::memory::Memory;

/// A graph position bound to an agent.
///
/// The variant tag is what the executor branches on: after a `Classifier`
/// node only intent-matching outgoing edges fire, after a `Completion` node
/// all of them do. Several node ids may hold clones of the same `Arc`.
#[derive(Clone)]
pub enum GraphNode {
    Completion(Arc<Agent>),
    Classifier(Arc<IntentClassifier>),
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphNode::Completion(agent) => {
                f.debug_tuple("Completion").field(&agent.name()).finish()
            }
            GraphNode::Classifier(classifier) => {
                f.debug_tuple("Classifier").field(&classifier.name()).finish()
            }
        }
    }
}

impl GraphNode {
    pub fn name(&self) -> &str {
        match self {
            GraphNode::Completion(agent) => agent.name(),
            GraphNode::Classifier(classifier) => classifier.name(),
        }
    }

    pub fn is_classifier(&self) -> bool {
        matches!(self, GraphNode::Classifier(_))
    }

    /// Run the bound agent for one edge.
    ///
    /// A classifier only resolves and classifies; it ignores the edge's
    /// result key and handlers and stores nothing.
    pub async fn run(&self, memory: &dyn Memory, edge: &Edge) -> Result<String, EngineError> {
        match self {
            GraphNode::Completion(agent) => {
                agent
                    .run(
                        memory,
                        &edge.prompt,
                        edge.result_key.as_deref(),
                        edge.handlers.as_deref(),
                    )
                    .await
            }
            GraphNode::Classifier(classifier) => classifier.run(memory, &edge.prompt).await,
        }
    }
}
