//! Search command handler.
//!
//! Prints the top-k chunks of a corpus for a query, without any LLM call.

use super::setup;
use clap::Args;
use copilot_core::{config::AppConfig, AppError, AppResult};
use copilot_knowledge::Corpus;

/// Search a corpus directly
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Corpus to search (kb or tickets)
    #[arg(value_parser = parse_corpus)]
    pub corpus: Corpus,

    /// Search query
    pub query: String,

    /// Number of results
    #[arg(short, long, default_value_t = 5)]
    pub k: usize,

    /// Use the built-in demo knowledge base instead of the corpora
    #[arg(long)]
    pub demo: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_corpus(s: &str) -> Result<Corpus, String> {
    Corpus::parse(s).ok_or_else(|| format!("unknown corpus '{}' (expected kb or tickets)", s))
}

impl SearchCommand {
    /// Execute the search command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        if self.k == 0 {
            return Err(AppError::Config("-k must be greater than zero".to_string()));
        }

        let store = setup::open_store(config, self.demo)?;
        let results = store.search_scored(self.corpus, &self.query, self.k);
        tracing::debug!("{} results from {}", results.len(), self.corpus);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No results in {} for: {}", self.corpus, self.query);
            return Ok(());
        }

        for (rank, scored) in results.iter().enumerate() {
            let chunk = &scored.chunk;
            println!(
                "{}. [{}#{}] score={:.3}",
                rank + 1,
                chunk.source,
                chunk.chunk_id,
                scored.score
            );
            println!("   {}", chunk.content.replace('\n', "\n   "));
        }

        Ok(())
    }
}
