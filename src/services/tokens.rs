//! Approximate token accounting for usage reporting.

use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Characters per token when no exact tokenizer matches the model.
const FALLBACK_CHARS_PER_TOKEN: usize = 4;

/// Fixed allowance for the instruction template around the context.
const TEMPLATE_OVERHEAD_TOKENS: usize = 100;

/// Estimates the token cost of a completed query.
///
/// Picks a BPE tokenizer matched to the configured generation model and
/// falls back to a character-count heuristic for models without one.
/// Diagnostic only: estimation never fails and never blocks generation.
pub struct TokenAccountant {
    bpe: Option<CoreBPE>,
}

impl TokenAccountant {
    pub fn for_model(model: &str) -> Self {
        let bpe = tiktoken_rs::get_bpe_from_model(model).ok();
        if bpe.is_none() {
            debug!(model, "no exact tokenizer, using character heuristic");
        }
        Self { bpe }
    }

    /// Token count of a single text.
    pub fn count(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => text.chars().count() / FALLBACK_CHARS_PER_TOKEN,
        }
    }

    /// Total estimate for one query: query + answer + every retrieved
    /// chunk + a fixed template overhead.
    pub fn estimate_query(&self, query: &str, answer: &str, context: &[String]) -> usize {
        let context_tokens: usize = context.iter().map(|c| self.count(c)).sum();
        self.count(query) + self.count(answer) + context_tokens + TEMPLATE_OVERHEAD_TOKENS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_uses_bpe() {
        let accountant = TokenAccountant::for_model("gpt-4");
        assert!(accountant.bpe.is_some());
        assert!(accountant.count("hello world") > 0);
    }

    #[test]
    fn test_unknown_model_falls_back() {
        let accountant = TokenAccountant::for_model("llama-3.1-70b-versatile");
        assert!(accountant.bpe.is_none());
        assert_eq!(accountant.count("12345678"), 2);
        assert_eq!(accountant.count(""), 0);
    }

    #[test]
    fn test_estimate_includes_overhead_and_context() {
        let accountant = TokenAccountant::for_model("unknown-model");
        let context = vec!["a".repeat(40), "b".repeat(40)];
        let estimate = accountant.estimate_query(&"q".repeat(8), &"x".repeat(8), &context);
        // 2 + 2 + 10 + 10 + 100
        assert_eq!(estimate, 124);
    }

    #[test]
    fn test_empty_query_still_accounts_overhead() {
        let accountant = TokenAccountant::for_model("unknown-model");
        assert_eq!(accountant.estimate_query("", "", &[]), TEMPLATE_OVERHEAD_TOKENS);
    }
}
