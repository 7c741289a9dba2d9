use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use serde::Deserialize;

use crate::cli::output::get_formatter;
use crate::error::RetrainError;
use crate::models::{Config, OutputFormat};
use crate::services::{FeedbackSample, FeedbackSource, RetrainManager, TrainingJobService};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Args)]
pub struct RetrainArgs {
    #[arg(
        long,
        help = "JSONL file of feedback samples ({\"query\": ..., \"response\": ...} per line)"
    )]
    pub samples: Option<PathBuf>,

    #[arg(long, default_value_t = 10, help = "Minimum sample count to start a job")]
    pub threshold: usize,

    #[arg(long, help = "Base model to fine-tune")]
    pub model: Option<String>,
}

pub async fn handle_retrain(args: RetrainArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    // The credential is only needed once the threshold is met; a
    // keyless run can still report the skipped outcome
    let api_key = config
        .providers
        .openai_api_key
        .clone()
        .filter(|k| !k.is_empty());

    if verbose {
        if let Some(ref path) = args.samples {
            eprintln!("Reading feedback samples from {}", path.display());
        } else {
            eprintln!("No samples file given, collecting zero samples");
        }
        eprintln!("Threshold: {}", args.threshold);
    }

    let feedback = JsonlFeedback {
        path: args.samples.clone(),
    };
    let trainer = OpenAiFineTuner::new(api_key, config.providers.timeout_secs)?;

    let manager = RetrainManager::new(Box::new(feedback), Box::new(trainer));
    let outcome = manager.retrain(args.threshold, args.model.as_deref()).await?;

    print!("{}", formatter.format_retrain(&outcome));

    Ok(())
}

/// Feedback samples read from a local JSONL export.
///
/// A missing path yields zero samples, which the manager reports as a
/// skipped outcome rather than an error.
struct JsonlFeedback {
    path: Option<PathBuf>,
}

#[async_trait]
impl FeedbackSource for JsonlFeedback {
    async fn positive_samples(&self) -> Result<Vec<FeedbackSample>, RetrainError> {
        let Some(ref path) = self.path else {
            return Ok(Vec::new());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| RetrainError::Feedback(format!("{}: {}", path.display(), e)))?;

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                serde_json::from_str::<FeedbackSample>(line)
                    .map_err(|e| RetrainError::Feedback(format!("malformed sample line: {e}")))
            })
            .collect()
    }
}

/// Submits fine-tuning jobs to the OpenAI API: upload the dataset as a
/// file, then create a job referencing it.
///
/// The credential is checked at submission time, not construction, so
/// a run that never reaches the threshold needs no key at all.
struct OpenAiFineTuner {
    client: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FineTuningJobResponse {
    id: String,
}

impl OpenAiFineTuner {
    fn new(api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl TrainingJobService for OpenAiFineTuner {
    async fn submit(
        &self,
        dataset: Vec<String>,
        base_model: Option<&str>,
    ) -> Result<String, RetrainError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RetrainError::Submission("fine-tuning requires OPENAI_API_KEY to be set".to_string())
        })?;

        let jsonl = dataset.join("\n");

        let part = reqwest::multipart::Part::bytes(jsonl.into_bytes())
            .file_name("training.jsonl")
            .mime_str("application/jsonl")
            .map_err(|e| RetrainError::Submission(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "fine-tune")
            .part("file", part);

        let upload: FileUploadResponse = self
            .client
            .post(format!("{OPENAI_BASE_URL}/files"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RetrainError::Submission(format!("file upload failed: {e}")))?
            .error_for_status()
            .map_err(|e| RetrainError::Submission(format!("file upload rejected: {e}")))?
            .json()
            .await
            .map_err(|e| RetrainError::Submission(format!("invalid upload response: {e}")))?;

        let body = serde_json::json!({
            "training_file": upload.id,
            "model": base_model.unwrap_or("gpt-3.5-turbo"),
        });

        let job: FineTuningJobResponse = self
            .client
            .post(format!("{OPENAI_BASE_URL}/fine_tuning/jobs"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrainError::Submission(format!("job creation failed: {e}")))?
            .error_for_status()
            .map_err(|e| RetrainError::Submission(format!("job creation rejected: {e}")))?
            .json()
            .await
            .map_err(|e| RetrainError::Submission(format!("invalid job response: {e}")))?;

        Ok(job.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::services::RetrainOutcome;

    #[tokio::test]
    async fn test_missing_samples_file_yields_empty() {
        let feedback = JsonlFeedback { path: None };
        assert!(feedback.positive_samples().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_jsonl_samples_are_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"query": "How do I reset?", "response": "Open settings."}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"query": "Pricing?", "response": "See the plans page."}}"#).unwrap();

        let feedback = JsonlFeedback {
            path: Some(file.path().to_path_buf()),
        };
        let samples = feedback.positive_samples().await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].query, "How do I reset?");
        assert_eq!(samples[1].response, "See the plans page.");
    }

    #[tokio::test]
    async fn test_below_threshold_needs_no_credential() {
        let manager = RetrainManager::new(
            Box::new(JsonlFeedback { path: None }),
            Box::new(OpenAiFineTuner::new(None, 30).unwrap()),
        );

        let outcome = manager.retrain(10, None).await.unwrap();
        assert!(matches!(
            outcome,
            RetrainOutcome::Skipped {
                samples_collected: 0,
                threshold: 10,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_submit_without_credential_fails() {
        let trainer = OpenAiFineTuner::new(None, 30).unwrap();
        let err = trainer
            .submit(vec!["{}".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, RetrainError::Submission(_)));
    }

    #[tokio::test]
    async fn test_malformed_line_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let feedback = JsonlFeedback {
            path: Some(file.path().to_path_buf()),
        };
        assert!(matches!(
            feedback.positive_samples().await,
            Err(RetrainError::Feedback(_))
        ));
    }
}
