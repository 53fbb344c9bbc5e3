//! Knowledge store: chunking, embedding, persistence, and
//! retrieval-augmented question answering.
//!
//! The store owns an append-only [`VectorIndex`] persisted as a single JSON
//! file. Every `store` operation ends with a full synchronous save; a missing
//! or unreadable index on open is recovered by starting fresh.

pub mod chunker;
pub mod index;
pub mod store;

pub use chunker::split_text;
pub use index::{Chunk, VectorIndex, cosine_similarity};
pub use store::{KnowledgeStore, QueryAnswer, SourceRef, StoreReceipt};
