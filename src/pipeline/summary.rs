//! Summarization: Markdown prefix → short prose summary via a chat model.
//!
//! [`Summarizer`] is the seam the converter talks to. [`LlmSummarizer`] is the
//! production implementation on top of an edgequake-llm chat provider; the
//! converter truncates the input with [`truncate_chars`] before calling it.
//! There is no retry here: a failed request is reported once and the caller
//! decides what to do.

use crate::config::ConversionConfig;
use crate::error::Pdf2MdError;
use crate::prompts::{summary_prompt, SUMMARY_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Service label used in error messages.
pub const SUMMARY_SERVICE: &str = "mistral-chat";

/// Anything that can summarise a block of text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarise `text` in at most `max_tokens` tokens.
    async fn summarize(&self, text: &str, max_tokens: usize) -> Result<String, Pdf2MdError>;
}

/// [`Summarizer`] backed by an edgequake-llm chat provider.
pub struct LlmSummarizer {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    /// Use the pre-built provider on the config, or create a Mistral chat
    /// provider for `summary_model`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2MdError> {
        let provider = match config.summary_provider {
            Some(ref provider) => Arc::clone(provider),
            None => ProviderFactory::create_llm_provider("mistral", &config.summary_model)
                .map_err(|e| Pdf2MdError::ProviderNotConfigured {
                    provider: "mistral".to_string(),
                    hint: format!("Could not create chat provider for '{}': {e}", config.summary_model),
                })?,
        };
        Ok(Self::new(provider, config.temperature))
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, text: &str, max_tokens: usize) -> Result<String, Pdf2MdError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(summary_prompt(text)),
        ];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                warn!("Summary request failed: {}", e);
                Pdf2MdError::SummaryFailed(e.to_string())
            })?;

        debug!(
            "Summary: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        let summary = response.content.trim().to_string();
        if summary.is_empty() {
            return Err(Pdf2MdError::MalformedResponse {
                service: SUMMARY_SERVICE.to_string(),
                detail: "empty completion".to_string(),
            });
        }
        Ok(summary)
    }
}

/// The first `limit` characters of `text`, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
