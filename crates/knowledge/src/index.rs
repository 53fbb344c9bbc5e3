//! The serialized vector index and similarity search over it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use contentiq_shared::{ContentIqError, Result};

/// Current on-disk index format version.
pub const CURRENT_INDEX_VERSION: u32 = 1;

/// One embedded sub-span of a document. Immutable once written; corrections
/// require re-ingesting the source, which appends new chunks alongside the
/// old ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_url: String,
    pub source_title: String,
    /// Position within the source document; `chunk_index < chunk_count`.
    pub chunk_index: usize,
    pub chunk_count: usize,
    pub embedding: Vec<f32>,
    /// Summary of the source document at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Takeaways of the source document at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub takeaways: Option<Vec<String>>,
}

/// Append-only collection of chunks, persisted as one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Format version for forward compatibility.
    pub schema_version: u32,
    chunks: Vec<Chunk>,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_INDEX_VERSION,
            chunks: Vec::new(),
        }
    }
}

impl VectorIndex {
    /// Load an index from `path`. Errors if the file is missing or unreadable;
    /// the caller decides whether that is recoverable.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ContentIqError::io(path, e))?;
        let index: Self = serde_json::from_str(&raw).map_err(|e| {
            ContentIqError::Store(format!("corrupt index at {}: {e}", path.display()))
        })?;

        if index.schema_version != CURRENT_INDEX_VERSION {
            return Err(ContentIqError::Store(format!(
                "unsupported index version {} at {}",
                index.schema_version,
                path.display()
            )));
        }

        Ok(index)
    }

    /// Persist the entire index to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ContentIqError::io(parent, e))?;
        }
        let json = serde_json::to_vec(self)
            .map_err(|e| ContentIqError::Store(format!("serialize index: {e}")))?;
        std::fs::write(path, json).map_err(|e| ContentIqError::io(path, e))?;
        Ok(())
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: Chunk) {
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-`k` chunks by cosine similarity to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(f32, &Chunk)> {
        let mut scored: Vec<(f32, &Chunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(query, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

/// Cosine similarity of two vectors; 0.0 for mismatched lengths or zero norms.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
