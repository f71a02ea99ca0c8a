//! Intent classification by nearest-neighbor match over example utterances.
//!
//! Instead of generating text, a classifier node embeds its resolved prompt
//! and matches it against labeled examples. The winning label drives edge
//! gating in the executor; a match worse than the distance threshold yields
//! the [`INTENT_NONE`] sentinel and the traversal ends there.

mod index;

pub use index::{FlatL2Index, IntentIndex};

use std::path::PathBuf;
use std::sync::Arc;

use ethers::utils::keccak256;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::agent::resolve_placeholders;
use crate::ai::EmbeddingClient;
use crate::error::EngineError;
use crate::memory::Memory;

/// Sentinel returned when no example is close enough.
pub const INTENT_NONE: &str = "None";

/// Squared-L2 distance above which a match is rejected.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Neighbors inspected per query; only the best one decides.
const SEARCH_K: usize = 3;

/// One labeled example utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentExample {
    pub label: String,
    pub utterance: String,
}

impl IntentExample {
    pub fn new(label: impl Into<String>, utterance: impl Into<String>) -> Self {
        IntentExample {
            label: label.into(),
            utterance: utterance.into(),
        }
    }
}

/// Embedding-backed intent classifier.
///
/// The index is built lazily on first use: loaded from `index_path` when a
/// persisted copy with a matching example fingerprint exists, otherwise
/// rebuilt from the examples (and saved back when a path is set).
pub struct IntentClassifier {
    name: String,
    examples: Vec<IntentExample>,
    threshold: f32,
    embedder: Arc<dyn EmbeddingClient>,
    index_path: Option<PathBuf>,
    index: RwLock<Option<Arc<IntentIndex>>>,
}

impl IntentClassifier {
    pub fn new(
        name: impl Into<String>,
        examples: Vec<IntentExample>,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Self {
        IntentClassifier {
            name: name.into(),
            examples,
            threshold: DEFAULT_THRESHOLD,
            embedder,
            index_path: None,
            index: RwLock::new(None),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fingerprint of the example list, stored with a persisted index so a
    /// stale file is detected and rebuilt instead of silently served.
    fn fingerprint(&self) -> String {
        let mut payload = String::new();
        for example in &self.examples {
            payload.push_str(&example.label);
            payload.push('\u{1f}');
            payload.push_str(&example.utterance);
            payload.push('\u{1e}');
        }
        hex::encode(keccak256(payload.as_bytes()))
    }

    async fn ensure_index(&self) -> Result<Arc<IntentIndex>, EngineError> {
        if let Some(index) = self.index.read().clone() {
            return Ok(index);
        }

        if self.examples.is_empty() {
            return Err(EngineError::Configuration(format!(
                "classifier '{}' has no example utterances",
                self.name
            )));
        }

        let fingerprint = self.fingerprint();

        if let Some(path) = &self.index_path {
            if path.exists() {
                match IntentIndex::load(path) {
                    Ok(index) if index.fingerprint() == fingerprint => {
                        log::info!(
                            "[INTENT] '{}' loaded index from {} ({} examples)",
                            self.name,
                            path.display(),
                            index.len()
                        );
                        let index = Arc::new(index);
                        *self.index.write() = Some(index.clone());
                        return Ok(index);
                    }
                    Ok(_) => {
                        log::warn!(
                            "[INTENT] '{}' persisted index at {} is stale, rebuilding",
                            self.name,
                            path.display()
                        );
                    }
                    Err(e) => {
                        log::warn!(
                            "[INTENT] '{}' failed to load index from {}: {}, rebuilding",
                            self.name,
                            path.display(),
                            e
                        );
                    }
                }
            }
        }

        let mut index = IntentIndex::new(self.embedder.dimension(), fingerprint);
        for example in &self.examples {
            let vector = self
                .embedder
                .embed(&example.utterance)
                .await
                .map_err(EngineError::Execution)?;
            index.add(example.label.clone(), vector)?;
        }
        log::info!(
            "[INTENT] '{}' built index with {} examples",
            self.name,
            index.len()
        );

        if let Some(path) = &self.index_path {
            if let Err(e) = index.save(path) {
                log::warn!(
                    "[INTENT] '{}' failed to persist index to {}: {}",
                    self.name,
                    path.display(),
                    e
                );
            }
        }

        let index = Arc::new(index);
        *self.index.write() = Some(index.clone());
        Ok(index)
    }

    /// Classify already-resolved text.
    pub async fn classify(&self, text: &str) -> Result<String, EngineError> {
        let index = self.ensure_index().await?;

        let query = self
            .embedder
            .embed(text)
            .await
            .map_err(EngineError::Execution)?;

        let (label, distance) = index
            .best_match(&query, SEARCH_K)
            .ok_or_else(|| {
                EngineError::Configuration(format!("classifier '{}' index is empty", self.name))
            })?;

        if distance >= self.threshold {
            log::info!(
                "[INTENT] '{}' best match '{}' too far ({:.3}), returning {}",
                self.name,
                label,
                distance,
                INTENT_NONE
            );
            return Ok(INTENT_NONE.to_string());
        }

        log::info!(
            "[INTENT] '{}' matched intent '{}' (distance {:.3})",
            self.name,
            label,
            distance
        );
        Ok(label.to_string())
    }

    /// Resolve placeholders against memory, then classify.
    ///
    /// Errors propagate typed, the same as `Agent::run`; nothing is stored
    /// in memory.
    pub async fn run(&self, memory: &dyn Memory, prompt: &str) -> Result<String, EngineError> {
        let resolved = resolve_placeholders(prompt, &memory.load_map());
        self.classify(&resolved).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::{FailingEmbedder, StaticEmbedder};
    use crate::memory::{InMemoryMemory, Memory as _, Message};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn examples() -> Vec<IntentExample> {
        vec![
            IntentExample::new("recommend", "suggest a place to eat"),
            IntentExample::new("pay", "send some money"),
        ]
    }

    fn embedder() -> Arc<StaticEmbedder> {
        Arc::new(StaticEmbedder::new(
            vec![
                ("suggest a place to eat", vec![1.0, 0.0]),
                ("send some money", vec![0.0, 1.0]),
                ("where should I have dinner", vec![0.9, 0.1]),
                ("transfer 5 eth", vec![0.1, 0.9]),
            ],
            vec![10.0, 10.0],
        ))
    }

    #[tokio::test]
    async fn test_classify_nearest_label() {
        let classifier = IntentClassifier::new("router", examples(), embedder());
        assert_eq!(
            classifier.classify("where should I have dinner").await.unwrap(),
            "recommend"
        );
        assert_eq!(classifier.classify("transfer 5 eth").await.unwrap(), "pay");
    }

    #[tokio::test]
    async fn test_classify_beyond_threshold_returns_none() {
        let classifier = IntentClassifier::new("router", examples(), embedder());
        // Unknown text embeds to the far-away fallback vector
        assert_eq!(
            classifier.classify("what is the weather").await.unwrap(),
            INTENT_NONE
        );
    }

    #[tokio::test]
    async fn test_run_resolves_placeholders() {
        let memory = InMemoryMemory::new();
        memory
            .add(Message::new("USER_INPUT_0", "user", "transfer 5 eth"))
            .unwrap();

        let classifier = IntentClassifier::new("router", examples(), embedder());
        assert_eq!(
            classifier.run(&memory, "^USER_INPUT_0^").await.unwrap(),
            "pay"
        );
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let classifier = IntentClassifier::new(
            "router",
            examples(),
            Arc::new(FailingEmbedder { dimension: 2 }),
        );
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(matches!(err, EngineError::Execution(_)));
    }

    #[tokio::test]
    async fn test_no_examples_is_configuration_error() {
        let classifier = IntentClassifier::new("router", vec![], embedder());
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    /// Counts embed calls so tests can tell a disk load from a rebuild.
    struct CountingEmbedder {
        inner: Arc<StaticEmbedder>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl crate::ai::EmbeddingClient for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text).await
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    #[tokio::test]
    async fn test_persisted_index_is_reused_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.index");

        let first = IntentClassifier::new("router", examples(), embedder())
            .with_index_path(&path);
        first.classify("transfer 5 eth").await.unwrap();
        assert!(path.exists());

        let counting = Arc::new(CountingEmbedder {
            inner: embedder(),
            calls: AtomicUsize::new(0),
        });
        let second = IntentClassifier::new("router", examples(), counting.clone())
            .with_index_path(&path);
        assert_eq!(second.classify("transfer 5 eth").await.unwrap(), "pay");

        // Only the query was embedded; the examples came from disk
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_persisted_index_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.index");

        let first = IntentClassifier::new("router", examples(), embedder())
            .with_index_path(&path);
        first.classify("transfer 5 eth").await.unwrap();

        // Same path, different example list: fingerprint mismatch
        let mut changed = examples();
        changed.push(IntentExample::new("weather", "what is the forecast"));
        let counting = Arc::new(CountingEmbedder {
            inner: embedder(),
            calls: AtomicUsize::new(0),
        });
        let second = IntentClassifier::new("router", changed, counting.clone())
            .with_index_path(&path);
        second.classify("transfer 5 eth").await.unwrap();

        // Three examples re-embedded plus the query
        assert_eq!(counting.calls.load(Ordering::SeqCst), 4);
    }
}
