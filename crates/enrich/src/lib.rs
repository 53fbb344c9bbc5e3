//! Text enrichment stages for ContentIQ.
//!
//! Two batch stages — [`Summarizer`] and [`TakeawayExtractor`] — each take a
//! batch of content records and return them augmented with one derived field.
//! Both are length- and order-preserving: a per-item LLM failure keeps the
//! original item unmodified and is recorded in the stage report; the batch
//! never aborts.
//!
//! [`ContentAnalyst`] carries the one-shot enrichments used by the file-based
//! subcommands (keywords, sentiment, categories, ad-hoc analysis).

pub mod adhoc;
pub mod summary;
pub mod takeaways;

use serde::{Deserialize, Serialize};

use contentiq_shared::ItemFailure;

pub use adhoc::ContentAnalyst;
pub use summary::Summarizer;
pub use takeaways::{TakeawayExtractor, parse_takeaways};

/// Counters and failures for one enrichment stage over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// Items in the batch.
    pub total: usize,
    /// Items that received the derived field.
    pub enriched: usize,
    /// Per-item failures, in input order.
    pub failures: Vec<ItemFailure>,
}

/// Truncate content to at most `max_chars` characters, on a char boundary.
pub(crate) fn truncate_content(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}
