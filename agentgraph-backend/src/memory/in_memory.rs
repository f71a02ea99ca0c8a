use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Memory, Message};
use crate::error::EngineError;

/// In-process append-only store.
///
/// Keeps the insertion-ordered log and an id index side by side. No eviction
/// and no TTL: the log lives exactly as long as the store does.
#[derive(Debug, Default)]
pub struct InMemoryMemory {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    log: Vec<Message>,
    index: HashMap<String, usize>,
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.inner.read().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().log.is_empty()
    }
}

impl Memory for InMemoryMemory {
    fn add(&self, message: Message) -> Result<(), EngineError> {
        let mut inner = self.inner.write();
        if inner.index.contains_key(&message.id) {
            return Err(EngineError::DuplicateKey(message.id));
        }
        let pos = inner.log.len();
        inner.index.insert(message.id.clone(), pos);
        inner.log.push(message);
        Ok(())
    }

    fn load(&self) -> Vec<Message> {
        self.inner.read().log.clone()
    }

    fn load_map(&self) -> HashMap<String, Message> {
        let inner = self.inner.read();
        inner
            .index
            .iter()
            .map(|(id, &pos)| (id.clone(), inner.log[pos].clone()))
            .collect()
    }

    fn get_by_id(&self, id: &str) -> Result<Message, EngineError> {
        let inner = self.inner.read();
        inner
            .index
            .get(id)
            .map(|&pos| inner.log[pos].clone())
            .ok_or_else(|| EngineError::message_not_found(id))
    }
}
