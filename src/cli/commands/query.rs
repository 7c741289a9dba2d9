use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use uuid::Uuid;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::providers::ProviderRegistry;
use crate::services::{QueryPipeline, VectorStore, create_backend};
use crate::utils::retry::{RetryConfig, with_retry};

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(required = true, help = "Question to ask")]
    pub query: String,

    #[arg(long, short = 'k', help = "Number of context chunks to retrieve")]
    pub top_k: Option<u32>,

    #[arg(long, help = "Session identifier for log correlation")]
    pub session: Option<String>,
}

pub async fn handle_query(args: QueryArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("query cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let top_k = args.top_k.unwrap_or(config.rag.top_k);
    if top_k == 0 {
        anyhow::bail!("top_k must be at least 1");
    }

    let session_id = args
        .session
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Session: {session_id}");
        eprintln!("  Top-k: {top_k}");
    }

    let registry = ProviderRegistry::from_config(&config.providers)?;
    let store: Arc<dyn VectorStore> = Arc::from(create_backend(&config.vector_store)?);
    let pipeline = QueryPipeline::new(
        registry.embedding(),
        registry.generation(),
        store,
        config.rag.temperature,
        config.rag.max_tokens,
    );

    let result = with_retry(&RetryConfig::default(), || {
        pipeline.query(query, &session_id, top_k as usize)
    })
    .await?;

    if verbose {
        eprintln!("Total: {}ms", start_time.elapsed().as_millis());
        eprintln!();
    }

    print!("{}", formatter.format_answer(&result));

    Ok(())
}
