//! Intent classification with a deterministic fallback.
//!
//! The LLM path asks for a structured JSON object and treats the response as
//! untrusted input. Any call or parse failure falls back to keyword matching,
//! which is total and side-effect-free, so the orchestrator is never blocked
//! by classifier unavailability.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use contentiq_backends::TextGenerator;
use contentiq_shared::{Action, ContentIqError, Entities, Intent, Result};

/// Confidence assigned to keyword-matched fallback intents.
const FALLBACK_KEYWORD_CONFIDENCE: f32 = 0.7;

/// Confidence assigned to the final default fallback branch.
const FALLBACK_DEFAULT_CONFIDENCE: f32 = 0.5;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid URL pattern"));

/// Maps free-text prompts to structured intents. Never fails.
pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Classify a prompt. Internal errors are absorbed and replaced by the
    /// deterministic fallback.
    pub async fn classify(&self, prompt: &str) -> Intent {
        match self.classify_with_llm(prompt).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "intent classification failed, using fallback");
                fallback_classification(prompt)
            }
        }
    }

    async fn classify_with_llm(&self, prompt: &str) -> Result<Intent> {
        let request = build_classification_prompt(prompt);
        let response = self.generator.complete(&request).await?;

        let json = extract_json_object(&response)
            .ok_or_else(|| ContentIqError::parse("classifier response contained no JSON object"))?;

        let raw: RawIntent = serde_json::from_str(json)
            .map_err(|e| ContentIqError::parse(format!("classifier response: {e}")))?;

        // Missing action means the model answered but declined to pick one;
        // treat the prompt as a knowledge-base question. An unrecognized
        // action string is a parse failure and falls through to the fallback.
        let action = match raw.action.as_deref() {
            None | Some("") => Action::QueryKnowledgeBase,
            Some(s) => s.parse()?,
        };

        let urls = match raw.entities.urls {
            Some(urls) => urls,
            None => extract_urls(prompt),
        };

        let question = raw.entities.question.or_else(|| {
            (action == Action::QueryKnowledgeBase).then(|| prompt.to_string())
        });

        let intent = Intent {
            action,
            entities: Entities {
                urls,
                question,
                domain: raw.entities.domain,
            },
            confidence: raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
        };

        debug!(action = %intent.action, confidence = intent.confidence, "classified via LLM");
        Ok(intent)
    }
}

/// Loosely-typed shape of the classifier's JSON response.
#[derive(Debug, Default, Deserialize)]
struct RawIntent {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    entities: RawEntities,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    #[serde(default)]
    urls: Option<Vec<String>>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

fn build_classification_prompt(prompt: &str) -> String {
    format!(
        "Analyze the following user prompt and classify the intent. Extract any \
         URLs, domains, or questions mentioned.\n\n\
         User Prompt: \"{prompt}\"\n\n\
         Classify the intent as one of:\n\
         - crawl: User wants to scrape/crawl specific URLs or domains\n\
         - summarize: User wants summaries of content\n\
         - extract_takeaways: User wants key takeaways extracted\n\
         - build_knowledge_base: User wants to crawl content and store it for Q&A\n\
         - query_knowledge_base: User is asking a question about previously stored content\n\
         - full_analysis: User wants complete analysis (crawl + summarize + takeaways + store)\n\n\
         Return a JSON object with an \"action\" key holding the action type, an \
         \"entities\" object with a \"urls\" array, a \"question\" string, and a \
         \"domain\" string, and a \"confidence\" number between 0 and 1. Return \
         only the JSON object."
    )
}

/// Extract the outermost JSON object from a response that may carry code
/// fences or surrounding prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extract absolute URLs (`scheme://non-whitespace`) from raw text.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches([',', ')', '.', ';']).to_string())
        .collect()
}

/// Deterministic keyword classification, used when the LLM path fails.
///
/// Keyword priority is fixed: crawl/scrape, then summarize/summary, then
/// takeaway/"key points", then knowledge-base phrasing. The final default is
/// `full_analysis` when the prompt carries a URL, else `query_knowledge_base`
/// with the whole prompt as the question.
pub fn fallback_classification(prompt: &str) -> Intent {
    let lower = prompt.to_lowercase();

    let keyword_action = if lower.contains("crawl") || lower.contains("scrape") {
        Some(Action::Crawl)
    } else if lower.contains("summarize") || lower.contains("summary") {
        Some(Action::Summarize)
    } else if lower.contains("takeaway") || lower.contains("key points") {
        Some(Action::ExtractTakeaways)
    } else if lower.contains("knowledge base") || (lower.contains("build") && lower.contains("q&a"))
    {
        Some(Action::BuildKnowledgeBase)
    } else {
        None
    };

    if let Some(action) = keyword_action {
        return Intent {
            action,
            entities: Entities {
                urls: extract_urls(prompt),
                question: None,
                domain: None,
            },
            confidence: FALLBACK_KEYWORD_CONFIDENCE,
        };
    }

    let urls = extract_urls(prompt);
    if urls.is_empty() {
        Intent {
            action: Action::QueryKnowledgeBase,
            entities: Entities {
                urls,
                question: Some(prompt.to_string()),
                domain: None,
            },
            confidence: FALLBACK_DEFAULT_CONFIDENCE,
        }
    } else {
        Intent {
            action: Action::FullAnalysis,
            entities: Entities {
                urls,
                question: None,
                domain: None,
            },
            confidence: FALLBACK_DEFAULT_CONFIDENCE,
        }
    }
}
