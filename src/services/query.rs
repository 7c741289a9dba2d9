//! Retrieval-augmented query answering.

use std::sync::Arc;

use tracing::info;

use super::tokens::TokenAccountant;
use super::vector_store::VectorStore;
use crate::error::QueryError;
use crate::models::{GenerationResult, QuerySession, RetrievedContext};
use crate::providers::{EmbeddingProvider, GenerationProvider};

/// The fixed instruction template. It explicitly permits the model to
/// decline when the retrieved context is insufficient, which is the
/// safety net for queries against an empty or cold collection.
const PROMPT_TEMPLATE: &str = "You are an AI customer support assistant. Use the following pieces of context to answer the question at the end.
If you don't know the answer based on the context, just say that you don't know, don't try to make up an answer.

Context:
{context}

Question: {question}

Helpful Answer:";

/// Answers one user query grounded in the indexed corpus.
///
/// The query is embedded by the same provider that produced the indexed
/// vectors: both pipelines hold handles resolved from one registry, so
/// the consistency requirement is structural rather than conventional.
pub struct QueryPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    store: Arc<dyn VectorStore>,
    accountant: TokenAccountant,
    temperature: f32,
    max_tokens: u32,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        store: Arc<dyn VectorStore>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        let accountant = TokenAccountant::for_model(generator.model_name());
        Self {
            embedder,
            generator,
            store,
            accountant,
            temperature,
            max_tokens,
        }
    }

    /// Run one query: embed → retrieve → assemble prompt → generate →
    /// estimate tokens.
    ///
    /// Zero retrieval hits do not short-circuit: generation still runs
    /// with empty context and the template's decline instruction applies.
    pub async fn query(
        &self,
        text: &str,
        session_id: &str,
        top_k: usize,
    ) -> Result<GenerationResult, QueryError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(QueryError::InvalidQuery("query text is empty".to_string()));
        }
        if top_k == 0 {
            return Err(QueryError::InvalidQuery(
                "top_k must be at least 1".to_string(),
            ));
        }

        let session = QuerySession::new(query, session_id, top_k);
        info!(session_id = %session.session_id, top_k, "processing query");

        let query_vector = self.embedder.embed(&session.query).await?;

        let hits = self.store.search(&query_vector, session.top_k).await?;

        let context: Vec<RetrievedContext> = hits
            .into_iter()
            .map(|hit| RetrievedContext {
                content: hit.content,
                score: hit.score,
                document_id: hit.metadata.document_id,
                source: hit.metadata.source,
            })
            .collect();

        let prompt = assemble_prompt(&session.query, &context);

        let answer = self
            .generator
            .generate(&prompt, self.temperature, self.max_tokens)
            .await?;

        let context_texts: Vec<String> = context.iter().map(|c| c.content.clone()).collect();
        let tokens_used = self
            .accountant
            .estimate_query(&session.query, &answer, &context_texts);

        info!(
            session_id = %session.session_id,
            context_count = context.len(),
            tokens_used,
            "query completed"
        );

        Ok(GenerationResult {
            answer,
            context,
            model: self.generator.model_name().to_string(),
            tokens_used,
        })
    }
}

/// Substitute the retrieved chunks (descending relevance) and the query
/// into the instruction template.
fn assemble_prompt(query: &str, context: &[RetrievedContext]) -> String {
    let context_block = context
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    PROMPT_TEMPLATE
        .replace("{context}", &context_block)
        .replace("{question}", query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(content: &str, score: f32) -> RetrievedContext {
        RetrievedContext {
            content: content.to_string(),
            score,
            document_id: "doc".to_string(),
            source: "faq.md".to_string(),
        }
    }

    #[test]
    fn test_assemble_prompt_joins_context_in_order() {
        let context = vec![ctx("most relevant", 0.9), ctx("less relevant", 0.5)];
        let prompt = assemble_prompt("How do I reset?", &context);

        assert!(prompt.contains("most relevant\n\nless relevant"));
        assert!(prompt.contains("Question: How do I reset?"));
        assert!(prompt.find("most relevant").unwrap() < prompt.find("less relevant").unwrap());
    }

    #[test]
    fn test_assemble_prompt_empty_context() {
        let prompt = assemble_prompt("Anything?", &[]);
        assert!(prompt.contains("Context:\n\n"));
        assert!(prompt.contains("just say that you don't know"));
    }
}
