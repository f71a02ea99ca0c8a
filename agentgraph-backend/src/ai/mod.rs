//! Provider boundary for text generation and embeddings.
//!
//! Agents talk to [`CompletionClient`] / [`EmbeddingClient`] and never to a
//! concrete vendor API. Both clients speak `Result<_, String>` at the wire;
//! the agent layer wraps failures into `EngineError::Execution`.

pub mod claude;
pub mod embedding;
pub mod openai;

pub use claude::ClaudeClient;
pub use embedding::{EmbeddingClient, OpenAiEmbeddingClient};
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Text-generation capability.
///
/// One call, no retries at this layer; timeout handling belongs to the
/// concrete client.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String>;
}

/// Which concrete completion client to construct for an agent.
///
/// `openai` covers every OpenAI-compatible endpoint (Azure deployments,
/// DeepSeek-style gateways) via the endpoint override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Claude,
}

/// Scripted test doubles for the provider seams.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::CompletionClient;
    use super::embedding::EmbeddingClient;

    /// Returns the resolved user prompt unchanged.
    pub struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn generate(&self, _system: &str, user_prompt: &str) -> Result<String, String> {
            Ok(user_prompt.to_string())
        }
    }

    /// Pops one scripted reply per call; errors when the script runs dry.
    pub struct ScriptedClient {
        replies: Mutex<VecDeque<String>>,
    }

    impl ScriptedClient {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            ScriptedClient {
                replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn generate(&self, _system: &str, _user_prompt: &str) -> Result<String, String> {
            self.replies
                .lock()
                .pop_front()
                .ok_or_else(|| "scripted client exhausted".to_string())
        }
    }

    /// Always fails, for provider-error propagation tests.
    pub struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        async fn generate(&self, _system: &str, _user_prompt: &str) -> Result<String, String> {
            Err("provider unavailable".to_string())
        }
    }

    /// Maps known phrases to fixed vectors; unknown text embeds to the
    /// fallback vector.
    pub struct StaticEmbedder {
        known: HashMap<String, Vec<f32>>,
        fallback: Vec<f32>,
    }

    impl StaticEmbedder {
        pub fn new<I, S>(known: I, fallback: Vec<f32>) -> Self
        where
            I: IntoIterator<Item = (S, Vec<f32>)>,
            S: Into<String>,
        {
            StaticEmbedder {
                known: known.into_iter().map(|(k, v)| (k.into(), v)).collect(),
                fallback,
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for StaticEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
            Ok(self
                .known
                .get(text)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()))
        }

        fn dimension(&self) -> usize {
            self.fallback.len()
        }
    }

    /// Embedding provider that always fails.
    pub struct FailingEmbedder {
        pub dimension: usize,
    }

    #[async_trait]
    impl EmbeddingClient for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, String> {
            Err("embedding service unavailable".to_string())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}
