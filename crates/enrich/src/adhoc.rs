//! One-shot enrichments for single content records.
//!
//! Backs the `enrich`, `organize`, and `analyze` subcommands, which operate
//! on ad-hoc JSON content files rather than on workflow batches.

use std::sync::Arc;

use tracing::instrument;

use contentiq_backends::TextGenerator;
use contentiq_shared::{ContentRecord, Result};

/// One-shot LLM analyses over a single record's body.
pub struct ContentAnalyst {
    generator: Arc<dyn TextGenerator>,
}

impl ContentAnalyst {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Concise free-form summary of the record body.
    #[instrument(skip_all, fields(url = %record.url))]
    pub async fn summarize(&self, record: &ContentRecord) -> Result<String> {
        let prompt = format!(
            "Summarize the following content in a concise way:\n\n{}",
            record.body
        );
        Ok(self.generator.complete(&prompt).await?.trim().to_string())
    }

    /// The 5-10 most important keywords, parsed from a comma-separated list.
    #[instrument(skip_all, fields(url = %record.url))]
    pub async fn extract_keywords(&self, record: &ContentRecord) -> Result<Vec<String>> {
        let prompt = format!(
            "Extract the 5-10 most important keywords from this content. \
             Return them as a comma-separated list:\n\n{}",
            record.body
        );
        let response = self.generator.complete(&prompt).await?;
        Ok(split_comma_list(&response))
    }

    /// Sentiment classification with a short explanation.
    #[instrument(skip_all, fields(url = %record.url))]
    pub async fn analyze_sentiment(&self, record: &ContentRecord) -> Result<String> {
        let prompt = format!(
            "Analyze the sentiment of this content. Classify it as positive, \
             neutral, or negative, and explain why:\n\n{}",
            record.body
        );
        Ok(self.generator.complete(&prompt).await?.trim().to_string())
    }

    /// Assign the record to one or more of the caller-supplied categories.
    ///
    /// The LLM response is untrusted: only names matching a supplied category
    /// (case-insensitive) are kept.
    #[instrument(skip_all, fields(url = %record.url))]
    pub async fn categorize(
        &self,
        record: &ContentRecord,
        categories: &[String],
    ) -> Result<Vec<String>> {
        let prompt = format!(
            "Assign this content to one or more of the following categories: {}.\n\
             Return only the matching category names as a comma-separated list:\n\n{}",
            categories.join(", "),
            record.body
        );
        let response = self.generator.complete(&prompt).await?;

        let assigned: Vec<String> = split_comma_list(&response)
            .into_iter()
            .filter_map(|name| {
                categories
                    .iter()
                    .find(|c| c.eq_ignore_ascii_case(&name))
                    .cloned()
            })
            .collect();

        Ok(assigned)
    }

    /// Answer an ad-hoc query about the record body.
    #[instrument(skip_all, fields(url = %record.url))]
    pub async fn analyze(&self, record: &ContentRecord, query: &str) -> Result<String> {
        let prompt = format!(
            "Answer the following question about this content.\n\n\
             Question: {query}\n\n\
             Content:\n{}",
            record.body
        );
        Ok(self.generator.complete(&prompt).await?.trim().to_string())
    }
}

/// Split a comma-separated LLM response into trimmed non-empty entries.
fn split_comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|part| part.trim().trim_matches('.').trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Generator fake: echoes a canned response per prompt keyword.
    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn record() -> ContentRecord {
        ContentRecord::new("https://a.example", "T", "body text")
    }

    #[tokio::test]
    async fn keywords_are_split_and_trimmed() {
        let analyst = ContentAnalyst::new(Arc::new(CannedGenerator(
            "rust, async runtimes , vector search,".into(),
        )));
        let keywords = analyst.extract_keywords(&record()).await.expect("keywords");
        assert_eq!(keywords, vec!["rust", "async runtimes", "vector search"]);
    }

    #[tokio::test]
    async fn categorize_keeps_only_known_categories() {
        let analyst = ContentAnalyst::new(Arc::new(CannedGenerator(
            "Tech, Sports, imagined-category".into(),
        )));
        let categories = vec!["tech".to_string(), "finance".to_string()];
        let assigned = analyst
            .categorize(&record(), &categories)
            .await
            .expect("categorize");
        // Matched case-insensitively, returned with the caller's spelling.
        assert_eq!(assigned, vec!["tech"]);
    }

    #[tokio::test]
    async fn summarize_trims_response() {
        let analyst = ContentAnalyst::new(Arc::new(CannedGenerator("  summary here \n".into())));
        let summary = analyst.summarize(&record()).await.expect("summarize");
        assert_eq!(summary, "summary here");
    }
}
