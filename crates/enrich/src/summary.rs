//! Batch summarization stage.

use std::sync::Arc;

use tracing::{info, warn};

use contentiq_backends::TextGenerator;
use contentiq_shared::{ContentRecord, ItemFailure};

use crate::{StageReport, truncate_content};

/// Attaches a concise summary to each content record.
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    content_budget: usize,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, content_budget: usize) -> Self {
        Self {
            generator,
            content_budget,
        }
    }

    /// Summarize each item independently. Output length and order match the
    /// input; items whose LLM call fails pass through unmodified.
    pub async fn summarize_all(
        &self,
        items: Vec<ContentRecord>,
    ) -> (Vec<ContentRecord>, StageReport) {
        let mut report = StageReport {
            total: items.len(),
            ..Default::default()
        };
        let mut out = Vec::with_capacity(items.len());

        for mut item in items {
            let prompt = self.build_prompt(&item);
            match self.generator.complete(&prompt).await {
                Ok(response) => {
                    item.summary = Some(response.trim().to_string());
                    report.enriched += 1;
                }
                Err(e) => {
                    warn!(url = %item.url, error = %e, "summarization failed, keeping item as-is");
                    report.failures.push(ItemFailure {
                        url: item.url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            out.push(item);
        }

        info!(
            total = report.total,
            enriched = report.enriched,
            "summarization stage complete"
        );

        (out, report)
    }

    fn build_prompt(&self, item: &ContentRecord) -> String {
        format!(
            "Please provide a concise 3-4 sentence summary of the following content.\n\
             Focus on the main points, key insights, and most important information.\n\n\
             Title: {}\n\
             Content: {}\n\n\
             Summary:",
            item.title,
            truncate_content(&item.body, self.content_budget)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use contentiq_shared::{ContentIqError, Result};

    /// Generator fake: fails when the prompt mentions "flaky".
    struct FakeGenerator;

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.contains("flaky") {
                return Err(ContentIqError::Backend("model unavailable".into()));
            }
            Ok("  A concise summary.  ".into())
        }
    }

    fn records() -> Vec<ContentRecord> {
        vec![
            ContentRecord::new("https://a.example", "First", "stable content"),
            ContentRecord::new("https://b.example", "flaky", "content"),
        ]
    }

    #[tokio::test]
    async fn stage_is_length_and_order_preserving() {
        let stage = Summarizer::new(Arc::new(FakeGenerator), 3000);
        let input = records();
        let urls: Vec<String> = input.iter().map(|r| r.url.clone()).collect();

        let (out, report) = stage.summarize_all(input).await;
        assert_eq!(out.len(), 2);
        assert_eq!(
            out.iter().map(|r| r.url.clone()).collect::<Vec<_>>(),
            urls
        );
        assert_eq!(report.total, 2);
        assert_eq!(report.enriched, 1);
    }

    #[tokio::test]
    async fn failure_keeps_item_unmodified() {
        let stage = Summarizer::new(Arc::new(FakeGenerator), 3000);
        let item = ContentRecord::new("https://b.example", "flaky", "content");
        let original = item.clone();

        let (out, report) = stage.summarize_all(vec![item]).await;
        assert_eq!(out[0], original);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].url, "https://b.example");
    }

    #[tokio::test]
    async fn summary_is_trimmed() {
        let stage = Summarizer::new(Arc::new(FakeGenerator), 3000);
        let (out, _) = stage
            .summarize_all(vec![ContentRecord::new("https://a.example", "T", "body")])
            .await;
        assert_eq!(out[0].summary.as_deref(), Some("A concise summary."));
    }
}
