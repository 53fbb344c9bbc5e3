//! Content Fetcher: batch URL fetching with per-URL failure tolerance.
//!
//! URLs are processed independently and in order. A failure on one URL is
//! logged, recorded in the report, and that URL is omitted from the result —
//! the batch itself never fails. Callers that need all-or-nothing semantics
//! check the report.

pub mod files;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use contentiq_backends::Scraper;
use contentiq_shared::{ContentIqError, ContentRecord, ItemFailure, Result};

/// Counters and failures for one fetch batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchReport {
    /// URLs attempted.
    pub requested: usize,
    /// URLs that produced a record.
    pub succeeded: usize,
    /// Per-URL failures, in input order.
    pub failures: Vec<ItemFailure>,
}

/// Records plus the batch report.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<ContentRecord>,
    pub report: FetchReport,
}

/// Fetches documents through the scraping backend.
pub struct ContentFetcher {
    scraper: Arc<dyn Scraper>,
}

impl ContentFetcher {
    pub fn new(scraper: Arc<dyn Scraper>) -> Self {
        Self { scraper }
    }

    /// Fetch a batch of URLs. Result order matches input order (minus
    /// failures). Fails only when the input batch is empty.
    pub async fn fetch_all(&self, urls: &[String]) -> Result<FetchOutcome> {
        if urls.is_empty() {
            return Err(ContentIqError::validation("no URLs provided to fetch"));
        }

        let mut records = Vec::with_capacity(urls.len());
        let mut report = FetchReport {
            requested: urls.len(),
            ..Default::default()
        };

        for url in urls {
            match self.fetch_one(url).await {
                Ok(record) => {
                    report.succeeded += 1;
                    records.push(record);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "fetch failed, skipping URL");
                    report.failures.push(ItemFailure {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            requested = report.requested,
            succeeded = report.succeeded,
            "fetch batch complete"
        );

        Ok(FetchOutcome { records, report })
    }

    /// Fetch a single URL into a content record.
    pub async fn fetch_one(&self, url: &str) -> Result<ContentRecord> {
        let page = self.scraper.scrape(url).await?;

        let title = page
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string());
        let body = page
            .markdown
            .or(page.html)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ContentIqError::Scrape(format!("{url}: page had no content")))?;

        Ok(ContentRecord::new(url, title, body))
    }
}
