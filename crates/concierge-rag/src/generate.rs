use std::sync::Arc;
use std::time::{Duration, Instant};

use concierge_core::config::GenerationSettings;
use concierge_core::traits::AnswerGenerator;
use concierge_core::types::{FinishReason, GenerationRequest};
use concierge_llm::prompt;

use crate::error::PipelineFailure;

/// Answer used when the model returns no usable text.
pub const NO_ANSWER_APOLOGY: &str =
    "I apologize, but I cannot provide an answer at this time. Please contact the hotel staff for assistance.";

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self { Self { max_tokens: 500, temperature: 0.7, timeout: Duration::from_secs(30) } }
}

impl From<&GenerationSettings> for GenerationConfig {
    fn from(s: &GenerationSettings) -> Self {
        Self { max_tokens: s.max_tokens, temperature: s.temperature, timeout: Duration::from_millis(s.timeout_ms) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAnswer {
    pub text: String,
    pub finish_reason: FinishReason,
}

/// Prompts the language model with the assembled context.
pub struct AnswerComposer {
    generator: Arc<dyn AnswerGenerator>,
    config: GenerationConfig,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn AnswerGenerator>, config: GenerationConfig) -> Self { Self { generator, config } }

    pub fn request(&self, context: &str, question: &str, language: &str) -> GenerationRequest {
        GenerationRequest {
            system_prompt: prompt::system_prompt(language),
            user_content: prompt::user_content(context, question),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    pub async fn compose(&self, context: &str, question: &str, language: &str) -> Result<GeneratedAnswer, PipelineFailure> {
        let request = self.request(context, question, language);
        let started = Instant::now();
        let result = tokio::time::timeout(self.config.timeout, self.generator.generate(&request))
            .await
            .map_err(|_| PipelineFailure::timeout("generation", self.config.timeout))?
            .map_err(PipelineFailure::generation)?;
        tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, finish_reason = ?result.finish_reason, "generation finished");

        let text = match result.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => NO_ANSWER_APOLOGY.to_string(),
        };
        Ok(GeneratedAnswer { text, finish_reason: result.finish_reason })
    }
}
