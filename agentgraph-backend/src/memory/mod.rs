//! Shared message memory for graph task runs.
//!
//! The store is an append-only keyed log: every agent output (and the seeded
//! user input) lands here as an immutable [`Message`]. Prompt templates
//! reference earlier entries by id through `^id^` placeholders, so the store
//! doubles as the data plane between graph nodes.
//!
//! A store is explicitly constructed and handed to a task run; nothing here
//! is process-global. Callers that deliberately share one store across runs
//! must disambiguate seed ids themselves (see `GraphTask::run_task`).

mod export;
mod in_memory;

pub use export::render_transcript;
pub use in_memory::InMemoryMemory;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Author recorded on the seeded user-input message.
pub const USER_AUTHOR: &str = "user";

/// A single immutable memory entry.
///
/// Later writes with the same id are rejected, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Message {
            id: id.into(),
            author: author.into(),
            content: content.into(),
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        }
    }
}

/// Contract for a task-scoped message store.
pub trait Memory: Send + Sync {
    /// Append a message. Fails with [`EngineError::DuplicateKey`] when the id
    /// is already present; the store is left unchanged in that case.
    fn add(&self, message: Message) -> Result<(), EngineError>;

    /// All messages in insertion order.
    fn load(&self) -> Vec<Message>;

    /// Keyed snapshot for placeholder resolution.
    fn load_map(&self) -> HashMap<String, Message>;

    /// Lookup by id. Fails with [`EngineError::NotFound`] when absent.
    fn get_by_id(&self, id: &str) -> Result<Message, EngineError>;
}
