//! Core domain types for ContentIQ workflows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The six content-intelligence workflows a prompt can route to.
///
/// This is a closed enumeration: the orchestrator matches exhaustively, so
/// there is no "unknown action" path at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Crawl,
    Summarize,
    ExtractTakeaways,
    BuildKnowledgeBase,
    QueryKnowledgeBase,
    FullAnalysis,
}

impl Action {
    /// Wire/display name, matching the classification protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Summarize => "summarize",
            Self::ExtractTakeaways => "extract_takeaways",
            Self::BuildKnowledgeBase => "build_knowledge_base",
            Self::QueryKnowledgeBase => "query_knowledge_base",
            Self::FullAnalysis => "full_analysis",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = crate::ContentIqError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "crawl" => Ok(Self::Crawl),
            "summarize" => Ok(Self::Summarize),
            "extract_takeaways" => Ok(Self::ExtractTakeaways),
            "build_knowledge_base" => Ok(Self::BuildKnowledgeBase),
            "query_knowledge_base" => Ok(Self::QueryKnowledgeBase),
            "full_analysis" => Ok(Self::FullAnalysis),
            other => Err(crate::ContentIqError::parse(format!(
                "unknown action: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Entities extracted from a prompt during classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    /// Absolute URLs mentioned in the prompt (may be empty).
    #[serde(default)]
    pub urls: Vec<String>,
    /// Question text for knowledge-base queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Domain name, when the prompt mentions one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Structured interpretation of a free-text prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub entities: Entities,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f32,
}

// ---------------------------------------------------------------------------
// ContentRecord
// ---------------------------------------------------------------------------

/// One fetched document, progressively augmented by enrichment stages.
///
/// `url` and `title` are always non-empty once the record exists. Absent
/// `summary`/`takeaways` means that stage failed or was skipped — never an
/// empty-but-present value with distinct meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub url: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Up to 3 key takeaways, in LLM-reported order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub takeaways: Option<Vec<String>>,
    pub fetched_at: DateTime<Utc>,
    pub word_count: usize,
    /// Ad-hoc enrichments appended by the file-based subcommands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrichments: Vec<Enrichment>,
}

impl ContentRecord {
    /// Build a record from a freshly fetched document.
    pub fn new(url: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let word_count = word_count(&body);
        Self {
            url: url.into(),
            title: title.into(),
            body,
            summary: None,
            takeaways: None,
            fetched_at: Utc::now(),
            word_count,
            enrichments: Vec::new(),
        }
    }
}

/// Count whitespace-separated tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Kinds of ad-hoc enrichment produced by the `enrich`/`organize` subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    Summary,
    Keywords,
    Sentiment,
    Categories,
}

/// One enrichment result attached to a [`ContentRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub kind: EnrichmentKind,
    /// Kind-specific payload: a string for summary/sentiment, a string array
    /// for keywords/categories.
    pub data: serde_json::Value,
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: i64,
}

impl Enrichment {
    pub fn now(kind: EnrichmentKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            data,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemFailure
// ---------------------------------------------------------------------------

/// A recorded per-item failure inside a batch operation.
///
/// Batches collect successes and record failures for observability instead of
/// silently swallowing them; one item's failure never affects another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// URL of the item that failed.
    pub url: String,
    /// Human-readable failure reason.
    pub reason: String,
}
