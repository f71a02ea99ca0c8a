//! Queue-driven graph traversal.
//!
//! A [`GraphTask`] owns one graph reference and one memory store. Running it
//! seeds the user input, then walks edges breadth-first: dequeue, resolve the
//! target node, run its agent, emit a progress event, enqueue the successors
//! the branching rule admits. The walk is exposed as a finite async stream:
//! iterate incrementally to stream partial results, or drain it. Dropping
//! the stream abandons the remaining queue.

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::{pin_mut, StreamExt};
use serde::Serialize;

use super::{Edge, Graph};
use crate::error::EngineError;
use crate::memory::{render_transcript, Memory, Message, USER_AUTHOR};

/// One record per visited edge.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub agent: String,
    pub output: String,
}

/// Memory id the user input is seeded under for run `counter`.
pub fn seed_id(counter: u64) -> String {
    format!("USER_INPUT_{}", counter)
}

/// One traversal driver over a graph and a memory store.
///
/// The store is injected: give every run its own store, or share one across
/// runs deliberately and disambiguate seeds via `counter`.
pub struct GraphTask {
    graph: Arc<Graph>,
    memory: Arc<dyn Memory>,
}

impl GraphTask {
    pub fn new(graph: Arc<Graph>, memory: Arc<dyn Memory>) -> Self {
        GraphTask { graph, memory }
    }

    pub fn memory(&self) -> &Arc<dyn Memory> {
        &self.memory
    }

    /// Run the task, yielding one [`ProgressEvent`] per visited edge.
    ///
    /// Exactly one agent invocation is in flight at a time; sibling order is
    /// FIFO by enqueue time, which follows edge declaration order. The first
    /// error ends the stream; events already yielded stand.
    pub fn run_task(
        &self,
        input: impl Into<String>,
        counter: u64,
    ) -> impl Stream<Item = Result<ProgressEvent, EngineError>> + Send + 'static {
        let graph = Arc::clone(&self.graph);
        let memory = Arc::clone(&self.memory);
        let input = input.into();

        try_stream! {
            memory.add(Message::new(seed_id(counter), USER_AUTHOR, input))?;

            let mut queue: VecDeque<Edge> = graph.entry_edges()?.into();
            while let Some(edge) = queue.pop_front() {
                let node = graph.node(&edge.to)?;
                let output = node.run(memory.as_ref(), &edge).await?;

                log::info!("[TASK] visited '{}' via {} -> {}", node.name(), edge.from, edge.to);
                yield ProgressEvent {
                    agent: node.name().to_string(),
                    output: output.clone(),
                };

                let outgoing = graph.outgoing_edges(&edge.to);
                if node.is_classifier() {
                    // Only edges whose filter carries the produced label fire;
                    // an unfiltered edge never follows a classifier.
                    for e in outgoing {
                        if e.accepts_intent(&output) {
                            queue.push_back(e);
                        }
                    }
                } else {
                    queue.extend(outgoing);
                }
            }
        }
    }

    /// Drain the run and return the task's final result: the content of the
    /// last message appended to memory.
    pub async fn run_to_completion(
        &self,
        input: impl Into<String>,
        counter: u64,
    ) -> Result<String, EngineError> {
        let stream = self.run_task(input, counter);
        pin_mut!(stream);
        while let Some(event) = stream.next().await {
            event?;
        }

        Ok(self
            .memory
            .load()
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }

    /// Render the memory log as an HTML transcript.
    pub fn export_memory(&self) -> String {
        render_transcript(&self.memory.load())
    }
}
