//! The persistent knowledge store handle.
//!
//! Lifecycle: `open` loads the on-disk index (or starts fresh), `store`
//! appends and saves, `query` answers questions against the index. The store
//! is a single-writer resource; callers serialize all mutation through one
//! handle.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use contentiq_backends::{Embedder, TextGenerator};
use contentiq_shared::{ContentRecord, Result, StoreConfig};

use crate::chunker::split_text;
use crate::index::{Chunk, VectorIndex};

/// Index file name inside the store directory.
const INDEX_FILE_NAME: &str = "index.json";

/// Fixed answer for queries against an empty retrieval set.
const NO_CONTENT_ANSWER: &str =
    "I don't have any relevant content in my knowledge base to answer that question.";

/// Counters returned by a `store` operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreReceipt {
    pub documents_stored: usize,
    pub chunks_created: usize,
}

/// A deduplicated source reference in a query answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// Result of a retrieval-augmented query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    /// Unique sources in retrieval order.
    pub sources: Vec<SourceRef>,
    /// Best cosine similarity among retrieved chunks; 0.0 when nothing was
    /// retrieved.
    pub relevance: f32,
}

/// Persistent similarity-searchable store over content records.
pub struct KnowledgeStore {
    index_path: PathBuf,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
}

impl KnowledgeStore {
    /// Open the store rooted at `dir`, loading the persisted index.
    ///
    /// A missing or unreadable index is recoverable: the store starts from a
    /// fresh empty index and logs the condition.
    pub fn open(
        dir: &Path,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        config: &StoreConfig,
    ) -> Self {
        let index_path = dir.join(INDEX_FILE_NAME);

        let index = if index_path.exists() {
            match VectorIndex::load(&index_path) {
                Ok(index) => {
                    info!(path = %index_path.display(), chunks = index.len(), "loaded vector index");
                    index
                }
                Err(e) => {
                    warn!(path = %index_path.display(), error = %e, "failed to load index, starting fresh");
                    VectorIndex::default()
                }
            }
        } else {
            info!(path = %index_path.display(), "no existing index, starting fresh");
            VectorIndex::default()
        };

        Self {
            index_path,
            index,
            embedder,
            generator,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            top_k: config.top_k,
        }
    }

    /// Number of chunks currently indexed.
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Chunk, embed, and index a batch of records, then persist the entire
    /// index before returning.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn store(&mut self, items: &[ContentRecord]) -> Result<StoreReceipt> {
        let mut receipt = StoreReceipt::default();

        for item in items {
            let pieces = split_text(&item.body, self.chunk_size, self.chunk_overlap);
            let chunk_count = pieces.len();

            for (chunk_index, text) in pieces.into_iter().enumerate() {
                let embedding = self.embedder.embed(&text).await?;
                self.index.push(Chunk {
                    text,
                    source_url: item.url.clone(),
                    source_title: item.title.clone(),
                    chunk_index,
                    chunk_count,
                    embedding,
                    summary: item.summary.clone(),
                    takeaways: item.takeaways.clone(),
                });
            }

            receipt.documents_stored += 1;
            receipt.chunks_created += chunk_count;
        }

        // Full synchronous save: the on-disk index always reflects a
        // completed store operation.
        self.index.save(&self.index_path)?;

        info!(
            documents = receipt.documents_stored,
            chunks = receipt.chunks_created,
            total = self.index.len(),
            "stored and persisted"
        );

        Ok(receipt)
    }

    /// Answer `question` from the indexed content.
    #[instrument(skip_all)]
    pub async fn query(&self, question: &str) -> Result<QueryAnswer> {
        let query_vector = self.embedder.embed(question).await?;
        let retrieved = self.index.search(&query_vector, self.top_k);

        if retrieved.is_empty() {
            return Ok(QueryAnswer {
                answer: NO_CONTENT_ANSWER.to_string(),
                sources: Vec::new(),
                relevance: 0.0,
            });
        }

        let relevance = retrieved[0].0;

        let context = retrieved
            .iter()
            .map(|(_, chunk)| {
                format!(
                    "Source: {} ({})\n{}",
                    chunk.source_title, chunk.source_url, chunk.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let prompt = format!(
            "Use the following context to answer the question. If you cannot find \
             the answer in the context, say \"I don't have enough information to \
             answer that question.\"\n\n\
             Context:\n{context}\n\n\
             Question: {question}\n\n\
             Answer:"
        );

        let answer = self.generator.complete(&prompt).await?.trim().to_string();

        // Dedup sources by (title, url), preserving retrieval order.
        let mut seen = HashSet::new();
        let sources: Vec<SourceRef> = retrieved
            .iter()
            .map(|(_, chunk)| SourceRef {
                title: chunk.source_title.clone(),
                url: chunk.source_url.clone(),
            })
            .filter(|source| seen.insert(source.clone()))
            .collect();

        Ok(QueryAnswer {
            answer,
            sources,
            relevance,
        })
    }
}
