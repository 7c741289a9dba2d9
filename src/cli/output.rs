use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::models::{GenerationResult, OutputFormat};
use crate::services::{IngestReceipt, RetrainOutcome};

pub trait Formatter {
    fn format_answer(&self, result: &GenerationResult) -> String;
    fn format_ingest(&self, receipt: &IngestReceipt) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_retrain(&self, outcome: &RetrainOutcome) -> String;
    fn format_message(&self, message: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub vector_store_url: String,
    pub collection: String,
    pub vector_store_connected: bool,
    pub points_count: u64,
    pub embedding_provider: String,
    pub embedding_dimensions: usize,
    pub generation_model: String,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, result: &GenerationResult) -> String {
        let mut output = String::new();
        writeln!(output, "{}", result.answer.trim()).unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Model: {}  |  Estimated tokens: {}",
            result.model, result.tokens_used
        )
        .unwrap();

        if result.context.is_empty() {
            writeln!(output, "Context: (none retrieved)").unwrap();
        } else {
            writeln!(output, "Context ({} chunks):", result.context.len()).unwrap();
            for (i, ctx) in result.context.iter().enumerate() {
                let preview: String = ctx.content.chars().take(120).collect();
                let suffix = if ctx.content.chars().count() > 120 {
                    "..."
                } else {
                    ""
                };
                writeln!(
                    output,
                    "  {}. [{:.3}] {}: {}{}",
                    i + 1,
                    ctx.score,
                    ctx.source,
                    preview.replace('\n', " "),
                    suffix
                )
                .unwrap();
            }
        }

        output
    }

    fn format_ingest(&self, receipt: &IngestReceipt) -> String {
        format!(
            "Ingested {} as document {} ({} chunks)\n",
            receipt.filename, receipt.document_id, receipt.chunk_count
        )
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let store_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[UNREACHABLE]"
        };
        writeln!(output, "Vector store:  {}", store_status).unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        writeln!(output, "  Collection:  {}", status.collection).unwrap();
        writeln!(output, "  Records:     {}", status.points_count).unwrap();
        writeln!(
            output,
            "Embedding:     {} ({} dims)",
            status.embedding_provider, status.embedding_dimensions
        )
        .unwrap();
        writeln!(output, "Generation:    {}", status.generation_model).unwrap();

        output
    }

    fn format_retrain(&self, outcome: &RetrainOutcome) -> String {
        match outcome {
            RetrainOutcome::Skipped {
                reason,
                samples_collected,
                threshold,
            } => format!(
                "Retraining skipped: {} ({} of {} samples collected)\n",
                reason, samples_collected, threshold
            ),
            RetrainOutcome::Initiated {
                samples_used,
                job_id,
            } => format!(
                "Retraining job {} created with {} samples\n",
                job_id, samples_used
            ),
        }
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }
}

pub struct JsonFormatter;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .map(|s| format!("{}\n", s))
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}\n", e))
}

impl Formatter for JsonFormatter {
    fn format_answer(&self, result: &GenerationResult) -> String {
        to_json(result)
    }

    fn format_ingest(&self, receipt: &IngestReceipt) -> String {
        to_json(receipt)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        to_json(status)
    }

    fn format_retrain(&self, outcome: &RetrainOutcome) -> String {
        to_json(outcome)
    }

    fn format_message(&self, message: &str) -> String {
        to_json(&serde_json::json!({ "message": message }))
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_ingest_format() {
        let receipt = IngestReceipt {
            document_id: "abc".to_string(),
            chunk_count: 3,
            filename: "faq.md".to_string(),
        };
        let out = TextFormatter.format_ingest(&receipt);
        assert!(out.contains("faq.md"));
        assert!(out.contains("3 chunks"));
    }

    #[test]
    fn test_json_retrain_format_is_parseable() {
        let outcome = RetrainOutcome::Skipped {
            reason: "insufficient data".to_string(),
            samples_collected: 3,
            threshold: 10,
        };
        let out = JsonFormatter.format_retrain(&outcome);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["samples_collected"], 3);
    }
}
