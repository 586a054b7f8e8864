use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use concierge_core::error::{Error, Result};
use concierge_core::traits::{AnalyticsSink, AnswerGenerator, ChatLogStore, EmbeddingProvider, FaqStore, HotelStore, VectorStore};
use concierge_core::types::{AnalyticsEvent, AnswerPayload, ChatLogEntry, ChatLogRecord, HotelId, HotelProfile};

use crate::context::{ContextAssembler, RetrievalConfig, Retriever};
use crate::error::{ChatError, PipelineFailure};
use crate::fallback::FallbackResponder;
use crate::generate::{AnswerComposer, GenerationConfig};
use crate::policy;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const HISTORY_LIMIT: usize = 50;

/// One guest question as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub hotel_id: Option<HotelId>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(hotel_id: HotelId, question: impl Into<String>) -> Self {
        Self { hotel_id: Some(hotel_id), question: question.into(), ..Default::default() }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    pub confidence: f32,
    pub escalated: bool,
    pub session_id: String,
    pub was_ai_response: bool,
}

fn non_blank(value: Option<String>) -> Option<String> { value.filter(|v| !v.trim().is_empty()) }

/// Runs one guest question through validation, the answer pipeline and the
/// chat log.
pub struct ChatOrchestrator {
    hotels: Arc<dyn HotelStore>,
    context: ContextAssembler,
    composer: AnswerComposer,
    fallback: FallbackResponder,
    chat_logs: Arc<dyn ChatLogStore>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl ChatOrchestrator {
    pub fn builder() -> ChatOrchestratorBuilder { ChatOrchestratorBuilder::default() }

    pub async fn handle(&self, request: ChatRequest) -> std::result::Result<ChatResponse, ChatError> {
        let hotel_id = request.hotel_id.filter(|id| *id != 0).ok_or(ChatError::MissingInput)?;
        if request.question.trim().is_empty() {
            return Err(ChatError::MissingInput);
        }
        let hotel = self
            .hotels
            .active_hotel(hotel_id)
            .await
            .map_err(ChatError::Storage)?
            .ok_or(ChatError::HotelNotFound { hotel_id })?;

        let language = non_blank(request.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let session_id = non_blank(request.session_id).unwrap_or_else(|| format!("guest-{}", Utc::now().timestamp_millis()));

        let payload = self.answer(&hotel, &request.question, &language).await;

        let record = ChatLogRecord {
            hotel_id,
            session_id,
            question: request.question,
            answer: payload.answer,
            confidence: payload.confidence,
            was_ai_response: payload.was_ai_response,
            escalated: payload.escalated,
            language,
            created_at: Utc::now(),
        };
        self.chat_logs.append(&record).await.map_err(ChatError::ChatLog)?;
        self.analytics.record(AnalyticsEvent::chat_message(&record)).await;

        Ok(ChatResponse {
            answer: record.answer,
            confidence: record.confidence,
            escalated: record.escalated,
            session_id: record.session_id,
            was_ai_response: record.was_ai_response,
        })
    }

    /// Answers for an already verified hotel. Never fails: a primary pipeline
    /// failure switches to the fallback responder.
    pub async fn answer(&self, hotel: &HotelProfile, question: &str, language: &str) -> AnswerPayload {
        match self.primary(hotel, question, language).await {
            Ok(payload) => payload,
            Err(failure) => {
                tracing::warn!(hotel_id = hotel.id, kind = %failure.kind, error = %failure.message, "answer pipeline failed, falling back");
                self.fallback.respond(hotel, question).await
            }
        }
    }

    async fn primary(&self, hotel: &HotelProfile, question: &str, language: &str) -> std::result::Result<AnswerPayload, PipelineFailure> {
        let context = self.context.assemble(hotel, question).await?;
        tracing::debug!(hotel_id = hotel.id, faqs = context.faq_count, chunks = context.retrieved_chunks, "context assembled");
        let generated = self.composer.compose(&context.text, question, language).await?;
        Ok(policy::evaluate(generated, question, hotel.phone()))
    }

    /// Exchanges of one session, oldest first, capped at 50.
    pub async fn history(&self, hotel_id: Option<HotelId>, session_id: &str) -> std::result::Result<Vec<ChatLogEntry>, ChatError> {
        let hotel_id = hotel_id.filter(|id| *id != 0).ok_or(ChatError::MissingHotelId)?;
        self.chat_logs.history(hotel_id, session_id, HISTORY_LIMIT).await.map_err(ChatError::Storage)
    }
}

#[derive(Default)]
pub struct ChatOrchestratorBuilder {
    hotels: Option<Arc<dyn HotelStore>>,
    faqs: Option<Arc<dyn FaqStore>>,
    chat_logs: Option<Arc<dyn ChatLogStore>>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    retriever: Option<Retriever>,
    retrieval: RetrievalConfig,
    generation: GenerationConfig,
}

impl ChatOrchestratorBuilder {
    /// Uses one backend for hotels, FAQs, chat logs and analytics.
    pub fn store<S>(self, store: Arc<S>) -> Self
    where
        S: HotelStore + FaqStore + ChatLogStore + AnalyticsSink + 'static,
    {
        self.hotels(store.clone()).faqs(store.clone()).chat_logs(store.clone()).analytics(store)
    }

    pub fn hotels(mut self, hotels: Arc<dyn HotelStore>) -> Self {
        self.hotels = Some(hotels);
        self
    }

    pub fn faqs(mut self, faqs: Arc<dyn FaqStore>) -> Self {
        self.faqs = Some(faqs);
        self
    }

    pub fn chat_logs(mut self, chat_logs: Arc<dyn ChatLogStore>) -> Self {
        self.chat_logs = Some(chat_logs);
        self
    }

    pub fn analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Enables document retrieval. Without it the context holds hotel facts
    /// and FAQs only.
    pub fn retrieval(mut self, embedder: Arc<dyn EmbeddingProvider>, vectors: Arc<dyn VectorStore>) -> Self {
        self.retriever = Some(Retriever::new(embedder, vectors));
        self
    }

    pub fn retrieval_config(mut self, config: RetrievalConfig) -> Self {
        self.retrieval = config;
        self
    }

    pub fn generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation = config;
        self
    }

    pub fn build(self) -> Result<ChatOrchestrator> {
        fn required<T>(value: Option<T>, name: &str) -> Result<T> {
            value.ok_or_else(|| Error::InvalidConfig(format!("chat orchestrator requires a {name}")))
        }
        let faqs = required(self.faqs, "FAQ store")?;
        Ok(ChatOrchestrator {
            hotels: required(self.hotels, "hotel store")?,
            context: ContextAssembler::new(faqs.clone(), self.retriever, self.retrieval),
            composer: AnswerComposer::new(required(self.generator, "answer generator")?, self.generation),
            fallback: FallbackResponder::new(faqs),
            chat_logs: required(self.chat_logs, "chat log store")?,
            analytics: required(self.analytics, "analytics sink")?,
        })
    }
}
