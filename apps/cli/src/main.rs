//! ContentIQ CLI — natural-language content intelligence.
//!
//! Routes free-text prompts to crawling, summarization, takeaway extraction,
//! and knowledge-base workflows backed by a scraping API and an LLM.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
