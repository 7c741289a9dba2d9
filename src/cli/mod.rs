//! CLI module for the RAG pipeline.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Retrieval-augmented question answering over your own documents.
#[derive(Debug, Parser)]
#[command(name = "ragpipe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check infrastructure status (providers, Qdrant)
    Status,

    /// Ingest documents into the knowledge base
    Ingest(commands::IngestArgs),

    /// Ask a question against the indexed documents
    Query(commands::QueryArgs),

    /// Collect feedback and start a fine-tuning job
    Retrain(commands::RetrainArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

// FromStr for OutputFormat is implemented in models::answer
