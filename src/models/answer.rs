//! Query-side models: sessions, retrieved context, and answers.

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Ephemeral context for one query call. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySession {
    /// Opaque, caller-supplied session identifier.
    pub session_id: String,
    pub query: String,
    pub top_k: usize,
}

impl QuerySession {
    pub fn new(query: &str, session_id: &str, top_k: usize) -> Self {
        Self {
            session_id: session_id.to_string(),
            query: query.to_string(),
            top_k,
        }
    }
}

/// One retrieved chunk with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub content: String,
    pub score: f32,
    pub document_id: String,
    pub source: String,
}

/// The final answer produced by the query pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub answer: String,
    /// Retrieved context actually fed to the generation model, ordered by
    /// descending relevance. Empty when the collection had no matches.
    pub context: Vec<RetrievedContext>,
    pub model: String,
    pub tokens_used: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_round_trip() {
        for format in [OutputFormat::Text, OutputFormat::Json] {
            let parsed: OutputFormat = format.to_string().parse().unwrap();
            assert_eq!(parsed, format);
        }
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
