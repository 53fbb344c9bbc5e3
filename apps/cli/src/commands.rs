//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use contentiq_backends::{FirecrawlClient, OpenAiChat, OpenAiEmbeddings, TextGenerator};
use contentiq_core::{IntentClassifier, Orchestrator, ProcessedPrompt, WorkflowOutcome};
use contentiq_enrich::{ContentAnalyst, Summarizer, TakeawayExtractor};
use contentiq_fetch::{ContentFetcher, files};
use contentiq_knowledge::KnowledgeStore;
use contentiq_shared::{
    AppConfig, ContentRecord, Enrichment, EnrichmentKind, ItemFailure, config_file_path,
    init_config, load_config, validate_api_keys,
};

/// Sampling temperature for workflow chat completions.
const CHAT_TEMPERATURE: f32 = 0.7;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContentIQ — prompt-driven content intelligence.
#[derive(Parser)]
#[command(
    name = "contentiq",
    version,
    about = "Crawl, summarize, and question web content from natural-language prompts.",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
pub(crate) struct Cli {
    /// Natural-language prompt to process (omit for an interactive session).
    pub prompt: Option<String>,

    /// Start an interactive session.
    #[arg(short, long)]
    pub interactive: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a single page (or load a local file) into a content record.
    Fetch {
        /// URL to scrape.
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,

        /// Local content file (JSON record or plain text).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Write the record to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Enrich a content file with a summary, keywords, or sentiment.
    Enrich {
        /// Content file to enrich.
        #[arg(long)]
        file: PathBuf,

        /// Enrichment to apply.
        #[arg(long = "type", value_enum)]
        enrichment: EnrichType,

        /// Write the enriched record to this path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Assign a content file to caller-supplied categories.
    Organize {
        /// Content file to categorize.
        #[arg(long)]
        file: PathBuf,

        /// Candidate categories (comma-separated).
        #[arg(long)]
        categories: String,

        /// Write the categorized record to this path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Answer an ad-hoc question about a content file.
    Analyze {
        /// Content file to analyze.
        #[arg(long)]
        file: PathBuf,

        /// Question to answer about the content.
        #[arg(long)]
        query: String,

        /// Write the answer to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Enrichment type for the `enrich` subcommand.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum EnrichType {
    Summary,
    Keywords,
    Sentiment,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentiq=info",
        1 => "contentiq=debug",
        _ => "contentiq=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Fetch { url, file, output }) => {
            cmd_fetch(url.as_deref(), file.as_deref(), output.as_deref()).await
        }
        Some(Command::Enrich {
            file,
            enrichment,
            output,
        }) => cmd_enrich(&file, enrichment, output.as_deref()).await,
        Some(Command::Organize {
            file,
            categories,
            output,
        }) => cmd_organize(&file, &categories, output.as_deref()).await,
        Some(Command::Analyze {
            file,
            query,
            output,
        }) => cmd_analyze(&file, &query, output.as_deref()).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
        None => match (cli.prompt, cli.interactive) {
            (Some(prompt), false) => cmd_prompt(&prompt).await,
            _ => cmd_repl().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Prompt processing
// ---------------------------------------------------------------------------

/// One-shot prompt processing. Errors propagate for a non-zero exit.
async fn cmd_prompt(prompt: &str) -> Result<()> {
    let config = load_config()?;
    validate_api_keys(&config)?;

    let mut orchestrator = build_orchestrator(&config)?;
    let result = process_with_spinner(&mut orchestrator, prompt).await?;
    render_result(&result);
    Ok(())
}

/// Interactive session: one prompt per line, `exit` quits, per-prompt errors
/// are printed and the loop continues.
async fn cmd_repl() -> Result<()> {
    let config = load_config()?;
    validate_api_keys(&config)?;

    let mut orchestrator = build_orchestrator(&config)?;

    println!("ContentIQ interactive session. Type a prompt, or 'exit' to quit.");
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("contentiq> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt.eq_ignore_ascii_case("exit") || prompt.eq_ignore_ascii_case("quit") {
            break;
        }

        match process_with_spinner(&mut orchestrator, prompt).await {
            Ok(result) => render_result(&result),
            Err(e) => println!("Error: {e}"),
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Run one prompt with an indicatif spinner while the pipeline executes.
async fn process_with_spinner(
    orchestrator: &mut Orchestrator,
    prompt: &str,
) -> Result<ProcessedPrompt> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message("Processing prompt...");

    let result = orchestrator.process(prompt).await;
    spinner.finish_and_clear();

    Ok(result?)
}

/// Wire the full pipeline from config and environment.
fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let openai_key = std::env::var(&config.openai.api_key_env)
        .map_err(|_| eyre!("{} is not set", config.openai.api_key_env))?;
    let firecrawl_key = std::env::var(&config.firecrawl.api_key_env)
        .map_err(|_| eyre!("{} is not set", config.firecrawl.api_key_env))?;

    let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiChat::new(
        &openai_key,
        &config.openai.base_url,
        &config.openai.chat_model,
        CHAT_TEMPERATURE,
    )?);
    let embedder = Arc::new(OpenAiEmbeddings::new(
        &openai_key,
        &config.openai.base_url,
        &config.openai.embedding_model,
    )?);
    let scraper = Arc::new(FirecrawlClient::new(
        &firecrawl_key,
        &config.firecrawl.base_url,
    )?);

    let store = KnowledgeStore::open(
        Path::new(&config.store.path),
        embedder,
        generator.clone(),
        &config.store,
    );

    Ok(Orchestrator::new(
        IntentClassifier::new(generator.clone()),
        ContentFetcher::new(scraper),
        Summarizer::new(generator.clone(), config.defaults.content_budget),
        TakeawayExtractor::new(generator.clone(), config.defaults.content_budget),
        store,
    ))
}

// ---------------------------------------------------------------------------
// Result rendering
// ---------------------------------------------------------------------------

fn render_result(result: &ProcessedPrompt) {
    println!();
    println!(
        "  Action: {} (confidence {:.2})",
        result.intent.action, result.intent.confidence
    );
    println!();

    match &result.outcome {
        WorkflowOutcome::Crawl { records, fetch } => {
            for record in records {
                println!(
                    "  - {} ({}) [{} words]",
                    record.title, record.url, record.word_count
                );
            }
            print_failures(&fetch.failures);
        }
        WorkflowOutcome::Summarize { records, fetch, .. } => {
            for record in records {
                println!("  {}", record.title);
                match &record.summary {
                    Some(summary) => println!("    {summary}"),
                    None => println!("    (no summary available)"),
                }
                println!();
            }
            print_failures(&fetch.failures);
        }
        WorkflowOutcome::ExtractTakeaways { records, fetch, .. } => {
            for record in records {
                println!("  {}", record.title);
                match &record.takeaways {
                    Some(takeaways) => {
                        for (i, takeaway) in takeaways.iter().enumerate() {
                            println!("    {}. {takeaway}", i + 1);
                        }
                    }
                    None => println!("    (no takeaways available)"),
                }
                println!();
            }
            print_failures(&fetch.failures);
        }
        WorkflowOutcome::BuildKnowledgeBase { fetch, receipt } => {
            println!("  Documents stored: {}", receipt.documents_stored);
            println!("  Chunks created:   {}", receipt.chunks_created);
            print_failures(&fetch.failures);
        }
        WorkflowOutcome::QueryKnowledgeBase { answer } => {
            println!("  {}", answer.answer);
            if !answer.sources.is_empty() {
                println!();
                println!("  Sources:");
                for source in &answer.sources {
                    println!("  - {} ({})", source.title, source.url);
                }
                println!("  Relevance: {:.2}", answer.relevance);
            }
        }
        WorkflowOutcome::FullAnalysis {
            records,
            fetch,
            summaries,
            takeaways,
            receipt,
        } => {
            println!("  Pages crawled: {}/{}", fetch.succeeded, fetch.requested);
            println!("  Summaries:     {}/{}", summaries.enriched, summaries.total);
            println!("  Takeaways:     {}/{}", takeaways.enriched, takeaways.total);
            match receipt {
                Some(receipt) => println!("  Chunks stored: {}", receipt.chunks_created),
                None => println!("  Chunks stored: (storage failed)"),
            }
            println!();
            for record in records {
                println!("  {}", record.title);
                if let Some(summary) = &record.summary {
                    println!("    {summary}");
                }
                if let Some(takeaways) = &record.takeaways {
                    for (i, takeaway) in takeaways.iter().enumerate() {
                        println!("    {}. {takeaway}", i + 1);
                    }
                }
                println!();
            }
            print_failures(&fetch.failures);
        }
    }

    println!();
    println!("  {}", result.summary);
    println!();
}

fn print_failures(failures: &[ItemFailure]) {
    for failure in failures {
        println!("  ! {}: {}", failure.url, failure.reason);
    }
}

// ---------------------------------------------------------------------------
// File-based subcommands
// ---------------------------------------------------------------------------

async fn cmd_fetch(url: Option<&str>, file: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = load_config()?;

    let record = match (url, file) {
        (Some(url), None) => {
            Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;
            let firecrawl_key = std::env::var(&config.firecrawl.api_key_env)
                .map_err(|_| eyre!("{} is not set", config.firecrawl.api_key_env))?;
            let scraper = Arc::new(FirecrawlClient::new(
                &firecrawl_key,
                &config.firecrawl.base_url,
            )?);
            let fetcher = ContentFetcher::new(scraper);
            fetcher.fetch_one(url).await?
        }
        (None, Some(path)) => files::read_record(path)?,
        _ => return Err(eyre!("provide exactly one of --url or --file")),
    };

    info!(url = %record.url, words = record.word_count, "fetched content");
    emit_record(&record, output)
}

async fn cmd_enrich(file: &Path, enrichment: EnrichType, output: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let analyst = build_analyst(&config)?;
    let mut record = files::read_record(file)?;

    match enrichment {
        EnrichType::Summary => {
            let summary = analyst.summarize(&record).await?;
            println!("{summary}");
            record.summary = Some(summary.clone());
            record.enrichments.push(Enrichment::now(
                EnrichmentKind::Summary,
                serde_json::Value::String(summary),
            ));
        }
        EnrichType::Keywords => {
            let keywords = analyst.extract_keywords(&record).await?;
            println!("{}", keywords.join(", "));
            record.enrichments.push(Enrichment::now(
                EnrichmentKind::Keywords,
                serde_json::json!(keywords),
            ));
        }
        EnrichType::Sentiment => {
            let sentiment = analyst.analyze_sentiment(&record).await?;
            println!("{sentiment}");
            record.enrichments.push(Enrichment::now(
                EnrichmentKind::Sentiment,
                serde_json::Value::String(sentiment),
            ));
        }
    }

    if let Some(path) = output {
        files::write_record(&record, path)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

async fn cmd_organize(file: &Path, categories: &str, output: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let analyst = build_analyst(&config)?;
    let mut record = files::read_record(file)?;

    let candidates: Vec<String> = categories
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if candidates.is_empty() {
        return Err(eyre!("--categories must name at least one category"));
    }

    let assigned = analyst.categorize(&record, &candidates).await?;
    if assigned.is_empty() {
        println!("No matching categories.");
    } else {
        println!("{}", assigned.join(", "));
    }

    record.enrichments.push(Enrichment::now(
        EnrichmentKind::Categories,
        serde_json::json!(assigned),
    ));

    if let Some(path) = output {
        files::write_record(&record, path)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

async fn cmd_analyze(file: &Path, query: &str, output: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let analyst = build_analyst(&config)?;
    let record = files::read_record(file)?;

    let answer = analyst.analyze(&record, query).await?;
    match output {
        Some(path) => {
            std::fs::write(path, &answer)?;
            println!("Saved to {}", path.display());
        }
        None => println!("{answer}"),
    }
    Ok(())
}

/// Print or save a record as pretty JSON.
fn emit_record(record: &ContentRecord, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            files::write_record(record, path)?;
            println!("Saved to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(record)?),
    }
    Ok(())
}

fn build_analyst(config: &AppConfig) -> Result<ContentAnalyst> {
    let openai_key = std::env::var(&config.openai.api_key_env)
        .map_err(|_| eyre!("{} is not set", config.openai.api_key_env))?;
    let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiChat::new(
        &openai_key,
        &config.openai.base_url,
        &config.openai.chat_model,
        CHAT_TEMPERATURE,
    )?);
    Ok(ContentAnalyst::new(generator))
}

// ---------------------------------------------------------------------------
// Config subcommands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    println!("# {}", config_file_path()?.display());
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
