//! Flat squared-L2 nearest-neighbor index with file persistence.
//!
//! Small example sets make exhaustive search the right tool; there is no
//! approximate structure here. The labeled variant persists as two JSON
//! files: the vectors, and a `.metadata.json` sidecar carrying per-vector
//! labels plus a fingerprint of the source example list.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Exhaustive squared-L2 index over fixed-dimension vectors.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    pub fn new(dimension: usize) -> Self {
        FlatL2Index {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<(), EngineError> {
        if vector.len() != self.dimension {
            return Err(EngineError::Configuration(format!(
                "vector dimension mismatch: index is {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// The `k` nearest stored vectors, as (positions, squared-L2 distances),
    /// ascending by distance. Returns fewer than `k` entries when the index
    /// is smaller than `k`.
    pub fn search(&self, query: &[f32], k: usize) -> (Vec<usize>, Vec<f32>) {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, v)| (pos, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored.into_iter().unzip()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetadataFile {
    labels: Vec<String>,
    fingerprint: String,
}

/// A [`FlatL2Index`] whose vectors carry intent labels, persistable to disk.
#[derive(Debug, Clone)]
pub struct IntentIndex {
    index: FlatL2Index,
    labels: Vec<String>,
    fingerprint: String,
}

impl IntentIndex {
    pub fn new(dimension: usize, fingerprint: impl Into<String>) -> Self {
        IntentIndex {
            index: FlatL2Index::new(dimension),
            labels: Vec::new(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Fingerprint of the example list this index was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn add(&mut self, label: impl Into<String>, vector: Vec<f32>) -> Result<(), EngineError> {
        self.index.add(vector)?;
        self.labels.push(label.into());
        Ok(())
    }

    /// Nearest label and its squared-L2 distance, searching `k` candidates.
    pub fn best_match(&self, query: &[f32], k: usize) -> Option<(&str, f32)> {
        let (positions, distances) = self.index.search(query, k);
        let pos = *positions.first()?;
        Some((self.labels[pos].as_str(), distances[0]))
    }

    fn metadata_path(path: &Path) -> std::path::PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".metadata.json");
        name.into()
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Configuration(format!("failed to create index directory: {}", e))
            })?;
        }

        let index_json = serde_json::to_string(&IndexFile {
            dimension: self.index.dimension,
            vectors: self.index.vectors.clone(),
        })
        .map_err(|e| EngineError::Configuration(format!("failed to encode index: {}", e)))?;
        fs::write(path, index_json)
            .map_err(|e| EngineError::Configuration(format!("failed to write index: {}", e)))?;

        let metadata_json = serde_json::to_string(&MetadataFile {
            labels: self.labels.clone(),
            fingerprint: self.fingerprint.clone(),
        })
        .map_err(|e| EngineError::Configuration(format!("failed to encode metadata: {}", e)))?;
        fs::write(Self::metadata_path(path), metadata_json)
            .map_err(|e| EngineError::Configuration(format!("failed to write metadata: {}", e)))?;

        log::info!("[INTENT] index saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let index_json = fs::read_to_string(path)
            .map_err(|e| EngineError::Configuration(format!("failed to read index: {}", e)))?;
        let index_file: IndexFile = serde_json::from_str(&index_json)
            .map_err(|e| EngineError::Configuration(format!("failed to parse index: {}", e)))?;

        let metadata_json = fs::read_to_string(Self::metadata_path(path))
            .map_err(|e| EngineError::Configuration(format!("failed to read metadata: {}", e)))?;
        let metadata: MetadataFile = serde_json::from_str(&metadata_json)
            .map_err(|e| EngineError::Configuration(format!("failed to parse metadata: {}", e)))?;

        if metadata.labels.len() != index_file.vectors.len() {
            return Err(EngineError::Configuration(format!(
                "index/metadata mismatch: {} vectors, {} labels",
                index_file.vectors.len(),
                metadata.labels.len()
            )));
        }

        let mut index = FlatL2Index::new(index_file.dimension);
        for vector in index_file.vectors {
            index.add(vector)?;
        }

        Ok(IntentIndex {
            index,
            labels: metadata.labels,
            fingerprint: metadata.fingerprint,
        })
    }
}
