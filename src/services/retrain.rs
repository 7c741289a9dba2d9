//! Retraining collaborator: feedback collection seam, dataset
//! formatting, and hand-off to an external fine-tuning service.
//!
//! The selection contract for "positive feedback sample" (score
//! threshold, time window, deduplication) is not defined by this crate;
//! [`FeedbackSource`] is the pending interface callers implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RetrainError;

const SYSTEM_PROMPT: &str = "You are a helpful AI customer support assistant.";

/// One positively-rated query/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSample {
    pub query: String,
    pub response: String,
}

/// Supplies positive-feedback samples from wherever feedback lives.
#[async_trait]
pub trait FeedbackSource: Send + Sync {
    async fn positive_samples(&self) -> Result<Vec<FeedbackSample>, RetrainError>;
}

/// Submits a formatted dataset to an external training-job service.
#[async_trait]
pub trait TrainingJobService: Send + Sync {
    /// Returns the identifier of the created job.
    async fn submit(
        &self,
        dataset: Vec<String>,
        base_model: Option<&str>,
    ) -> Result<String, RetrainError>;
}

/// Outcome of one retraining attempt. Falling short of the threshold is
/// a skipped outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RetrainOutcome {
    Skipped {
        reason: String,
        samples_collected: usize,
        threshold: usize,
    },
    Initiated {
        samples_used: usize,
        job_id: String,
    },
}

/// Chat-format training example, one JSONL line per sample.
#[derive(Debug, Serialize)]
struct TrainingExample<'a> {
    messages: Vec<TrainingMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TrainingMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Orchestrates feedback collection, formatting, and job submission.
pub struct RetrainManager {
    feedback: Box<dyn FeedbackSource>,
    trainer: Box<dyn TrainingJobService>,
}

impl RetrainManager {
    pub fn new(feedback: Box<dyn FeedbackSource>, trainer: Box<dyn TrainingJobService>) -> Self {
        Self { feedback, trainer }
    }

    /// Collect samples and, if the threshold is met, format them and
    /// submit a fine-tuning job.
    pub async fn retrain(
        &self,
        threshold: usize,
        base_model: Option<&str>,
    ) -> Result<RetrainOutcome, RetrainError> {
        let samples = self.feedback.positive_samples().await?;

        if samples.len() < threshold {
            warn!(
                samples_collected = samples.len(),
                threshold, "not enough training data, skipping retrain"
            );
            return Ok(RetrainOutcome::Skipped {
                reason: "insufficient data".to_string(),
                samples_collected: samples.len(),
                threshold,
            });
        }

        let dataset = format_dataset(&samples)?;
        let samples_used = dataset.len();
        let job_id = self.trainer.submit(dataset, base_model).await?;

        info!(samples_used, %job_id, "retraining job created");

        Ok(RetrainOutcome::Initiated {
            samples_used,
            job_id,
        })
    }
}

/// Format samples as chat-style fine-tuning examples, one JSON line each.
fn format_dataset(samples: &[FeedbackSample]) -> Result<Vec<String>, RetrainError> {
    samples
        .iter()
        .map(|sample| {
            let example = TrainingExample {
                messages: vec![
                    TrainingMessage {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    TrainingMessage {
                        role: "user",
                        content: &sample.query,
                    },
                    TrainingMessage {
                        role: "assistant",
                        content: &sample.response,
                    },
                ],
            };
            Ok(serde_json::to_string(&example)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFeedback(Vec<FeedbackSample>);

    #[async_trait]
    impl FeedbackSource for StaticFeedback {
        async fn positive_samples(&self) -> Result<Vec<FeedbackSample>, RetrainError> {
            Ok(self.0.clone())
        }
    }

    struct RecordingTrainer;

    #[async_trait]
    impl TrainingJobService for RecordingTrainer {
        async fn submit(
            &self,
            dataset: Vec<String>,
            _base_model: Option<&str>,
        ) -> Result<String, RetrainError> {
            Ok(format!("job-{}", dataset.len()))
        }
    }

    fn sample(q: &str, r: &str) -> FeedbackSample {
        FeedbackSample {
            query: q.to_string(),
            response: r.to_string(),
        }
    }

    #[tokio::test]
    async fn test_below_threshold_is_skipped() {
        let manager = RetrainManager::new(
            Box::new(StaticFeedback(vec![
                sample("a", "b"),
                sample("c", "d"),
                sample("e", "f"),
            ])),
            Box::new(RecordingTrainer),
        );

        let outcome = manager.retrain(10, None).await.unwrap();
        match outcome {
            RetrainOutcome::Skipped {
                reason,
                samples_collected,
                threshold,
            } => {
                assert_eq!(reason, "insufficient data");
                assert_eq!(samples_collected, 3);
                assert_eq!(threshold, 10);
            }
            other => panic!("expected skipped, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_meeting_threshold_submits_job() {
        let samples: Vec<FeedbackSample> = (0..4)
            .map(|i| sample(&format!("q{i}"), &format!("r{i}")))
            .collect();
        let manager = RetrainManager::new(
            Box::new(StaticFeedback(samples)),
            Box::new(RecordingTrainer),
        );

        let outcome = manager.retrain(4, Some("gpt-3.5-turbo")).await.unwrap();
        match outcome {
            RetrainOutcome::Initiated {
                samples_used,
                job_id,
            } => {
                assert_eq!(samples_used, 4);
                assert_eq!(job_id, "job-4");
            }
            other => panic!("expected initiated, got {:?}", other),
        }
    }

    #[test]
    fn test_dataset_lines_are_chat_format() {
        let lines = format_dataset(&[sample("How do I reset?", "Open settings.")]).unwrap();
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "How do I reset?");
        assert_eq!(messages[2]["role"], "assistant");
    }
}
