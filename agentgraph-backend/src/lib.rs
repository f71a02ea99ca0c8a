//! AgentGraph backend: a directed graph of LLM-backed agents.
//!
//! Agents pass text through prompt templates that reference prior outputs by
//! memory id; traversal is a queue-driven breadth-first walk with intent-
//! gated branching. The HTTP layer streams one progress event per visited
//! edge over SSE.

pub mod agent;
pub mod ai;
pub mod config;
pub mod controllers;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod intent;
pub mod memory;

pub use agent::{Agent, GraphNode};
pub use error::EngineError;
pub use graph::{Edge, Graph, GraphTask, ProgressEvent};
pub use intent::{IntentClassifier, IntentExample};
pub use memory::{InMemoryMemory, Memory, Message};

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Shared application state behind the HTTP layer.
pub struct AppState {
    pub config: config::Config,
    pub graph: Arc<Graph>,
    /// Numbers task runs for logging; each run still gets its own memory.
    pub run_counter: AtomicU64,
}
