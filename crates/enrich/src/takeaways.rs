//! Batch key-takeaway extraction stage.

use std::sync::Arc;

use tracing::{info, warn};

use contentiq_backends::TextGenerator;
use contentiq_shared::{ContentRecord, ItemFailure};

use crate::{StageReport, truncate_content};

/// Maximum takeaways kept per item.
const MAX_TAKEAWAYS: usize = 3;

/// Attaches up to three key takeaways to each content record.
pub struct TakeawayExtractor {
    generator: Arc<dyn TextGenerator>,
    content_budget: usize,
}

impl TakeawayExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, content_budget: usize) -> Self {
        Self {
            generator,
            content_budget,
        }
    }

    /// Extract takeaways for each item independently. Output length and order
    /// match the input; items whose LLM call fails pass through unmodified.
    pub async fn extract_all(
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
                    item.takeaways = Some(parse_takeaways(&response));
                    report.enriched += 1;
                }
                Err(e) => {
                    warn!(url = %item.url, error = %e, "takeaway extraction failed, keeping item as-is");
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
            "takeaway stage complete"
        );

        (out, report)
    }

    fn build_prompt(&self, item: &ContentRecord) -> String {
        format!(
            "Extract exactly 3 key takeaways from the following content.\n\
             Each takeaway should be a clear, actionable insight or important fact.\n\
             Format your response as a numbered list (1., 2., 3.).\n\n\
             Title: {}\n\
             Content: {}\n\n\
             Key Takeaways:",
            item.title,
            truncate_content(&item.body, self.content_budget)
        )
    }
}

/// Parse a numbered-list response into at most three takeaways.
///
/// Lines matching `<integer>. <text>` are collected in order. If no line
/// matches and the response is non-empty, the whole trimmed response becomes
/// the single takeaway, so the field is never structurally empty.
pub fn parse_takeaways(text: &str) -> Vec<String> {
    let mut takeaways = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || takeaways.len() >= MAX_TAKEAWAYS {
            continue;
        }
        if let Some(rest) = strip_list_marker(line) {
            if !rest.is_empty() {
                takeaways.push(rest.to_string());
            }
        }
    }

    if takeaways.is_empty() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            takeaways.push(trimmed.to_string());
        }
    }

    takeaways
}

/// Strip a leading `<digits>.` marker, returning the trimmed remainder.
fn strip_list_marker(line: &str) -> Option<&str> {
    let digits_end = line.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let rest = line[digits_end..].strip_prefix('.')?;
    Some(rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use contentiq_shared::{ContentIqError, Result};

    #[test]
    fn parses_numbered_list() {
        assert_eq!(parse_takeaways("1. A\n2. B\n3. C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn caps_at_three_entries() {
        let parsed = parse_takeaways("1. A\n2. B\n3. C\n4. D\n5. E");
        assert_eq!(parsed, vec!["A", "B", "C"]);
    }

    #[test]
    fn unstructured_text_becomes_single_entry() {
        assert_eq!(parse_takeaways("just one idea"), vec!["just one idea"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(parse_takeaways("   \n  ").is_empty());
    }

    #[test]
    fn skips_unnumbered_preamble() {
        let parsed = parse_takeaways("Here are the takeaways:\n1. First\n2. Second");
        assert_eq!(parsed, vec!["First", "Second"]);
    }

    #[test]
    fn multi_digit_markers_parse() {
        // Only the first three survive regardless of numbering.
        let parsed = parse_takeaways("10. Ten\n11. Eleven\n12. Twelve\n13. Thirteen");
        assert_eq!(parsed, vec!["Ten", "Eleven", "Twelve"]);
    }

    /// Generator fake: always fails.
    struct AlwaysFails;

    #[async_trait]
    impl TextGenerator for AlwaysFails {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(ContentIqError::Backend("down".into()))
        }
    }

    #[tokio::test]
    async fn failure_keeps_item_without_takeaways() {
        let stage = TakeawayExtractor::new(Arc::new(AlwaysFails), 3000);
        let item = ContentRecord::new("https://a.example", "T", "body");

        let (out, report) = stage.extract_all(vec![item.clone()]).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], item);
        assert!(out[0].takeaways.is_none());
        assert_eq!(report.enriched, 0);
        assert_eq!(report.failures.len(), 1);
    }
}
