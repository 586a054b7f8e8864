use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AnalyticsEvent, ChatLogEntry, ChatLogRecord, DocumentChunk, FaqEntry, GenerationRequest, GenerationResult, HotelId,
    HotelProfile,
};

#[async_trait]
pub trait HotelStore: Send + Sync {
    /// Returns the hotel only when it exists and is active.
    async fn active_hotel(&self, id: HotelId) -> Result<Option<HotelProfile>>;
}

#[async_trait]
pub trait FaqStore: Send + Sync {
    /// Active FAQs in display order (`order_index`, then id). `None` means no cap.
    async fn active_faqs(&self, hotel_id: HotelId, limit: Option<usize>) -> Result<Vec<FaqEntry>>;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Chunks of at most `max_documents` active documents owned by the hotel
    /// and embedded by `embedder_id`. Vectors from other embedders are not
    /// comparable with the query and never count against the cap.
    async fn hotel_chunks(&self, hotel_id: HotelId, embedder_id: &str, max_documents: usize) -> Result<Vec<DocumentChunk>>;
}

#[async_trait]
pub trait ChatLogStore: Send + Sync {
    /// Durably records one exchange and returns its row id.
    async fn append(&self, record: &ChatLogRecord) -> Result<i64>;
    /// Exchanges of one session, oldest first.
    async fn history(&self, hotel_id: HotelId, session_id: &str, limit: usize) -> Result<Vec<ChatLogEntry>>;
}

/// Best-effort analytics. Implementations must swallow and log their own
/// failures; callers never observe them.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: AnalyticsEvent);
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `openai:text-embedding-3-small`).
    fn id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;
}
