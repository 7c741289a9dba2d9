use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::providers::ProviderRegistry;
use crate::services::{IngestionPipeline, TextChunker, VectorStore, create_backend};
use crate::utils::retry::{RetryConfig, with_retry};

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(required = true, help = "Files to ingest")]
    pub paths: Vec<PathBuf>,

    #[arg(long, help = "Override the detected media type for all files")]
    pub media_type: Option<String>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    config.rag.validate()?;
    let formatter = get_formatter(format);

    let registry = ProviderRegistry::from_config(&config.providers)?;
    let store: Arc<dyn VectorStore> = Arc::from(create_backend(&config.vector_store)?);
    let chunker = TextChunker::new(
        config.rag.chunk_size as usize,
        config.rag.chunk_overlap as usize,
    )?;
    let pipeline = IngestionPipeline::new(chunker, registry.embedding(), store);

    let retry = RetryConfig::default();
    let mut failures = 0usize;

    for path in &args.paths {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = args
            .media_type
            .clone()
            .unwrap_or_else(|| guess_media_type(path));

        if verbose {
            eprintln!(
                "Ingesting {} ({} bytes, {})",
                path.display(),
                bytes.len(),
                media_type
            );
        }

        let result = with_retry(&retry, || pipeline.ingest(&bytes, &filename, &media_type)).await;

        match result {
            Ok(receipt) => print!("{}", formatter.format_ingest(&receipt)),
            Err(e) => {
                failures += 1;
                eprintln!("Error ingesting {}: {}", path.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} files failed to ingest", args.paths.len());
    }

    Ok(())
}

fn guess_media_type(path: &Path) -> String {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "md" | "markdown" => "text/markdown",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_media_type() {
        assert_eq!(guess_media_type(Path::new("a/b/faq.PDF")), "application/pdf");
        assert_eq!(guess_media_type(Path::new("notes.md")), "text/markdown");
        assert_eq!(guess_media_type(Path::new("data.csv")), "text/csv");
        assert_eq!(
            guess_media_type(Path::new("mystery")),
            "application/octet-stream"
        );
    }
}
