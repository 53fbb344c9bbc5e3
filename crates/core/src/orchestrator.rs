//! Workflow orchestration.
//!
//! The orchestrator owns one instance of every pipeline stage and routes a
//! classified intent to its fixed pipeline. Routing is exhaustive over
//! [`Action`], so adding an action is a compile error until every arm exists.

use tracing::{info, instrument, warn};

use contentiq_enrich::{StageReport, Summarizer, TakeawayExtractor};
use contentiq_fetch::{ContentFetcher, FetchReport};
use contentiq_knowledge::{KnowledgeStore, QueryAnswer, StoreReceipt};
use contentiq_shared::{Action, ContentIqError, ContentRecord, Intent, Result};

use crate::classifier::IntentClassifier;

/// Result of executing one classified prompt.
#[derive(Debug)]
pub struct ProcessedPrompt {
    pub intent: Intent,
    pub outcome: WorkflowOutcome,
    /// One-line human-readable execution summary.
    pub summary: String,
}

/// Per-action payloads. One variant per [`Action`].
#[derive(Debug)]
pub enum WorkflowOutcome {
    Crawl {
        records: Vec<ContentRecord>,
        fetch: FetchReport,
    },
    Summarize {
        records: Vec<ContentRecord>,
        fetch: FetchReport,
        stage: StageReport,
    },
    ExtractTakeaways {
        records: Vec<ContentRecord>,
        fetch: FetchReport,
        stage: StageReport,
    },
    BuildKnowledgeBase {
        fetch: FetchReport,
        receipt: StoreReceipt,
    },
    QueryKnowledgeBase {
        answer: QueryAnswer,
    },
    FullAnalysis {
        records: Vec<ContentRecord>,
        fetch: FetchReport,
        summaries: StageReport,
        takeaways: StageReport,
        /// `None` when the store step failed; the analysis itself still
        /// completes with the enriched records.
        receipt: Option<StoreReceipt>,
    },
}

/// Routes prompts through classification into the matching pipeline.
pub struct Orchestrator {
    classifier: IntentClassifier,
    fetcher: ContentFetcher,
    summarizer: Summarizer,
    takeaways: TakeawayExtractor,
    store: KnowledgeStore,
}

impl Orchestrator {
    pub fn new(
        classifier: IntentClassifier,
        fetcher: ContentFetcher,
        summarizer: Summarizer,
        takeaways: TakeawayExtractor,
        store: KnowledgeStore,
    ) -> Self {
        Self {
            classifier,
            fetcher,
            summarizer,
            takeaways,
            store,
        }
    }

    /// Read access to the knowledge store, for status display.
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Classify `prompt` and run the pipeline for the resulting action.
    #[instrument(skip_all)]
    pub async fn process(&mut self, prompt: &str) -> Result<ProcessedPrompt> {
        let intent = self.classifier.classify(prompt).await;
        info!(action = %intent.action, confidence = intent.confidence, "executing workflow");

        let (outcome, summary) = match intent.action {
            Action::Crawl => self.run_crawl(&intent).await?,
            Action::Summarize => self.run_summarize(&intent).await?,
            Action::ExtractTakeaways => self.run_takeaways(&intent).await?,
            Action::BuildKnowledgeBase => self.run_build_knowledge_base(&intent).await?,
            Action::QueryKnowledgeBase => self.run_query(&intent).await?,
            Action::FullAnalysis => self.run_full_analysis(&intent).await?,
        };

        Ok(ProcessedPrompt {
            intent,
            outcome,
            summary,
        })
    }

    async fn run_crawl(&self, intent: &Intent) -> Result<(WorkflowOutcome, String)> {
        let (records, fetch) = self.fetch_pages(intent, Action::Crawl).await?;
        let summary = format!(
            "Successfully crawled {} of {} page(s).",
            fetch.succeeded, fetch.requested
        );
        Ok((WorkflowOutcome::Crawl { records, fetch }, summary))
    }

    async fn run_summarize(&self, intent: &Intent) -> Result<(WorkflowOutcome, String)> {
        let (fetched, fetch) = self.fetch_pages(intent, Action::Summarize).await?;
        let (records, stage) = self.summarizer.summarize_all(fetched).await;
        let summary = format!(
            "Generated summaries for {} out of {} page(s).",
            stage.enriched, stage.total
        );
        Ok((
            WorkflowOutcome::Summarize {
                records,
                fetch,
                stage,
            },
            summary,
        ))
    }

    async fn run_takeaways(&self, intent: &Intent) -> Result<(WorkflowOutcome, String)> {
        let (fetched, fetch) = self.fetch_pages(intent, Action::ExtractTakeaways).await?;
        let (records, stage) = self.takeaways.extract_all(fetched).await;
        let summary = format!(
            "Extracted key takeaways from {} out of {} page(s).",
            stage.enriched, stage.total
        );
        Ok((
            WorkflowOutcome::ExtractTakeaways {
                records,
                fetch,
                stage,
            },
            summary,
        ))
    }

    async fn run_build_knowledge_base(
        &mut self,
        intent: &Intent,
    ) -> Result<(WorkflowOutcome, String)> {
        let (records, fetch) = self.fetch_pages(intent, Action::BuildKnowledgeBase).await?;
        let receipt = self.store.store(&records).await?;
        let summary = format!(
            "Built knowledge base with {} document(s) and {} searchable chunks.",
            receipt.documents_stored, receipt.chunks_created
        );
        Ok((
            WorkflowOutcome::BuildKnowledgeBase { fetch, receipt },
            summary,
        ))
    }

    async fn run_query(&self, intent: &Intent) -> Result<(WorkflowOutcome, String)> {
        let question = intent
            .entities
            .question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| {
                ContentIqError::validation("query_knowledge_base requires a question")
            })?;

        let answer = self.store.query(question).await?;
        let summary = format!(
            "Retrieved answer from knowledge base with {} relevant source(s).",
            answer.sources.len()
        );
        Ok((WorkflowOutcome::QueryKnowledgeBase { answer }, summary))
    }

    /// Crawl, enrich, and store in one pass. Enrichment failures degrade
    /// softly; the pipeline stores whatever records survived fetching.
    async fn run_full_analysis(&mut self, intent: &Intent) -> Result<(WorkflowOutcome, String)> {
        let (fetched, fetch) = self.fetch_pages(intent, Action::FullAnalysis).await?;

        let (summarized, summaries) = self.summarizer.summarize_all(fetched).await;
        let (records, takeaways) = self.takeaways.extract_all(summarized).await;

        let receipt = match self.store.store(&records).await {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                warn!(error = %e, "knowledge store step failed, continuing without storage");
                None
            }
        };

        let storage_note = match &receipt {
            Some(receipt) => format!("stored {} searchable chunks", receipt.chunks_created),
            None => "storage failed".to_string(),
        };
        let summary = format!(
            "Complete analysis finished: crawled {} page(s), summarized {}, \
             extracted takeaways from {}, {storage_note}.",
            fetch.succeeded, summaries.enriched, takeaways.enriched
        );

        Ok((
            WorkflowOutcome::FullAnalysis {
                records,
                fetch,
                summaries,
                takeaways,
                receipt,
            },
            summary,
        ))
    }

    /// Shared fetch step for every URL-driven pipeline. Errors when the intent
    /// carries no URLs or when every fetch failed.
    async fn fetch_pages(
        &self,
        intent: &Intent,
        action: Action,
    ) -> Result<(Vec<ContentRecord>, FetchReport)> {
        if intent.entities.urls.is_empty() {
            return Err(ContentIqError::validation(format!(
                "{action} requires at least one URL"
            )));
        }

        let outcome = self.fetcher.fetch_all(&intent.entities.urls).await?;
        if outcome.records.is_empty() {
            return Err(ContentIqError::Scrape(format!(
                "all {} fetch(es) failed",
                outcome.report.requested
            )));
        }

        Ok((outcome.records, outcome.report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use contentiq_backends::{Embedder, ScrapedPage, Scraper, TextGenerator};
    use contentiq_shared::StoreConfig;
    use std::path::Path;
    use std::sync::Arc;

    /// Scraper fake: canned pages, failure for URLs containing "broken".
    struct FakeScraper;

    #[async_trait]
    impl Scraper for FakeScraper {
        async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
            if url.contains("broken") {
                return Err(ContentIqError::Scrape(format!("{url}: unreachable")));
            }
            Ok(ScrapedPage {
                title: Some("Fetched Page".into()),
                markdown: Some("body text about rust".into()),
                html: None,
            })
        }
    }

    /// Generator fake tuned per prompt shape. Classification prompts get a
    /// non-JSON reply, forcing the deterministic fallback.
    struct FakeGenerator {
        fail_summaries: bool,
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.contains("Summary:") && !prompt.contains("Context:") {
                if self.fail_summaries {
                    return Err(ContentIqError::Backend("model unavailable".into()));
                }
                return Ok("A summary.".into());
            }
            if prompt.contains("Key Takeaways:") {
                return Ok("1. First\n2. Second\n3. Third".into());
            }
            if prompt.contains("Context:") {
                return Ok("Answer from context.".into());
            }
            Ok("cannot classify that".into())
        }
    }

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.5])
        }
    }

    fn orchestrator(dir: &Path, fail_summaries: bool) -> Orchestrator {
        let generator = Arc::new(FakeGenerator { fail_summaries });
        let config = StoreConfig {
            path: String::new(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
        };
        Orchestrator::new(
            IntentClassifier::new(generator.clone()),
            ContentFetcher::new(Arc::new(FakeScraper)),
            Summarizer::new(generator.clone(), 3000),
            TakeawayExtractor::new(generator.clone(), 3000),
            KnowledgeStore::open(dir, Arc::new(FakeEmbedder), generator, &config),
        )
    }

    #[tokio::test]
    async fn crawl_workflow_reports_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), false);

        let result = orch
            .process("crawl https://a.example and https://broken.example")
            .await
            .expect("process");

        assert_eq!(result.intent.action, Action::Crawl);
        match result.outcome {
            WorkflowOutcome::Crawl { records, fetch } => {
                assert_eq!(records.len(), 1);
                assert_eq!(fetch.requested, 2);
                assert_eq!(fetch.failures.len(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(result.summary, "Successfully crawled 1 of 2 page(s).");
    }

    #[tokio::test]
    async fn crawl_without_urls_is_a_validation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), false);

        let err = orch.process("crawl the usual sites").await.unwrap_err();
        assert!(matches!(err, ContentIqError::Validation { .. }));
    }

    #[tokio::test]
    async fn all_fetches_failing_aborts_the_workflow() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), false);

        let err = orch
            .process("crawl https://broken.example/one https://broken.example/two")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentIqError::Scrape(_)));
    }

    #[tokio::test]
    async fn summarize_workflow_attaches_summaries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), false);

        let result = orch
            .process("summarize https://a.example")
            .await
            .expect("process");

        match result.outcome {
            WorkflowOutcome::Summarize { records, stage, .. } => {
                assert_eq!(records[0].summary.as_deref(), Some("A summary."));
                assert_eq!(stage.enriched, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn build_then_query_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), false);

        let built = orch
            .process("build a knowledge base from https://a.example")
            .await
            .expect("build");
        match built.outcome {
            WorkflowOutcome::BuildKnowledgeBase { receipt, .. } => {
                assert_eq!(receipt.documents_stored, 1);
                assert!(receipt.chunks_created >= 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let queried = orch
            .process("what does the page say about rust?")
            .await
            .expect("query");
        match queried.outcome {
            WorkflowOutcome::QueryKnowledgeBase { answer } => {
                assert_eq!(answer.answer, "Answer from context.");
                assert_eq!(answer.sources.len(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_on_empty_store_still_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), false);

        let result = orch
            .process("what did I store yesterday?")
            .await
            .expect("process");
        match result.outcome {
            WorkflowOutcome::QueryKnowledgeBase { answer } => {
                assert!(answer.sources.is_empty());
                assert_eq!(answer.relevance, 0.0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_analysis_runs_every_stage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), false);

        // No workflow keyword, URL present: fallback routes to full analysis.
        let result = orch
            .process("look into https://a.example please")
            .await
            .expect("process");

        assert_eq!(result.intent.action, Action::FullAnalysis);
        match result.outcome {
            WorkflowOutcome::FullAnalysis {
                records,
                summaries,
                takeaways,
                receipt,
                ..
            } => {
                assert_eq!(summaries.enriched, 1);
                assert_eq!(takeaways.enriched, 1);
                assert!(receipt.expect("receipt").chunks_created >= 1);
                assert!(records[0].summary.is_some());
                assert_eq!(
                    records[0].takeaways.as_deref(),
                    Some(&["First".to_string(), "Second".into(), "Third".into()][..])
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_analysis_stores_despite_summary_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut orch = orchestrator(dir.path(), true);

        let result = orch
            .process("look into https://a.example please")
            .await
            .expect("process");

        match result.outcome {
            WorkflowOutcome::FullAnalysis {
                summaries, receipt, ..
            } => {
                assert_eq!(summaries.enriched, 0);
                assert_eq!(summaries.failures.len(), 1);
                assert!(receipt.expect("receipt").chunks_created >= 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_analysis_continues_when_storage_fails() {
        struct FailingEmbedder;

        #[async_trait]
        impl Embedder for FailingEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Err(ContentIqError::Backend("embeddings offline".into()))
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let generator = Arc::new(FakeGenerator {
            fail_summaries: false,
        });
        let config = StoreConfig {
            path: String::new(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
        };
        let mut orch = Orchestrator::new(
            IntentClassifier::new(generator.clone()),
            ContentFetcher::new(Arc::new(FakeScraper)),
            Summarizer::new(generator.clone(), 3000),
            TakeawayExtractor::new(generator.clone(), 3000),
            KnowledgeStore::open(dir.path(), Arc::new(FailingEmbedder), generator, &config),
        );

        let result = orch
            .process("look into https://a.example please")
            .await
            .expect("process");

        match result.outcome {
            WorkflowOutcome::FullAnalysis {
                receipt, summaries, ..
            } => {
                assert!(receipt.is_none());
                assert_eq!(summaries.enriched, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(result.summary.contains("storage failed"));
    }
}
