//! External backend clients for ContentIQ.
//!
//! Every external collaborator is reached through a trait seam so that the
//! pipeline crates can be tested with in-process fakes:
//! - [`Scraper`] — text-extraction backend (`scrape(url) -> page`)
//! - [`TextGenerator`] — chat-completion backend (`complete(prompt) -> text`)
//! - [`Embedder`] — embedding backend (`embed(text) -> vector`)
//!
//! The HTTP implementations ([`FirecrawlClient`], [`OpenAiChat`],
//! [`OpenAiEmbeddings`]) are stateless, one-shot, and carry client-level
//! timeouts; retry policy is left to the caller.

pub mod embed;
pub mod llm;
pub mod scrape;

use async_trait::async_trait;
use contentiq_shared::Result;

pub use embed::OpenAiEmbeddings;
pub use llm::OpenAiChat;
pub use scrape::{FirecrawlClient, ScrapedPage};

/// Text-extraction backend: one URL in, one normalized page out.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage>;
}

/// Chat-completion backend: text in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Embedding backend: text in, fixed-length vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
