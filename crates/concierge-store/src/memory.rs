use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use concierge_core::error::{Error, Result};
use concierge_core::traits::{AnalyticsSink, ChatLogStore, FaqStore, HotelStore, VectorStore};
use concierge_core::types::{
    AnalyticsEvent, ChatLogEntry, ChatLogRecord, DocumentChunk, DocumentId, FaqEntry, HotelId, HotelProfile,
};

use crate::{DocumentWriter, NewDocument};

struct MemoryDocument {
    id: DocumentId,
    hotel_id: HotelId,
    content_hash: String,
    embedder_id: String,
    chunks: Vec<DocumentChunk>,
}

#[derive(Default)]
struct Inner {
    hotels: Vec<HotelProfile>,
    faqs: Vec<FaqEntry>,
    documents: Vec<MemoryDocument>,
    chat_logs: Vec<(i64, ChatLogRecord)>,
    analytics: Vec<AnalyticsEvent>,
}

/// In-process store used by tests and demos. Individual operations can be
/// switched to fail to exercise degradation paths.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    fail_faqs: AtomicBool,
    fail_vectors: AtomicBool,
    fail_chat_log: AtomicBool,
    fail_analytics: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Adds a hotel. An `id` of 0 is replaced by the next free id.
    pub fn add_hotel(&self, mut hotel: HotelProfile) -> HotelId {
        let mut inner = self.inner.write();
        if hotel.id == 0 { hotel.id = inner.hotels.iter().map(|h| h.id).max().unwrap_or(0) + 1; }
        let id = hotel.id;
        inner.hotels.push(hotel);
        id
    }

    pub fn add_faq(&self, mut faq: FaqEntry) -> i64 {
        let mut inner = self.inner.write();
        if faq.id == 0 { faq.id = inner.faqs.iter().map(|f| f.id).max().unwrap_or(0) + 1; }
        let id = faq.id;
        inner.faqs.push(faq);
        id
    }

    /// Stores pre-embedded chunks as one document of `hotel_id`, produced by
    /// the embedder named `embedder_id`.
    pub fn add_chunks(&self, hotel_id: HotelId, embedder_id: &str, chunks: Vec<(String, Vec<f32>)>) -> DocumentId {
        self.push_document(hotel_id, String::new(), embedder_id.to_string(), chunks)
    }

    fn push_document(&self, hotel_id: HotelId, content_hash: String, embedder_id: String, chunks: Vec<(String, Vec<f32>)>) -> DocumentId {
        let mut inner = self.inner.write();
        let id = inner.documents.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let chunks = chunks
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (content, embedding))| DocumentChunk { document_id: id, chunk_index, content, embedding })
            .collect();
        inner.documents.push(MemoryDocument { id, hotel_id, content_hash, embedder_id, chunks });
        id
    }

    pub fn chat_logs(&self) -> Vec<ChatLogRecord> { self.inner.read().chat_logs.iter().map(|(_, r)| r.clone()).collect() }

    pub fn analytics_events(&self) -> Vec<AnalyticsEvent> { self.inner.read().analytics.clone() }

    pub fn set_fail_faqs(&self, fail: bool) { self.fail_faqs.store(fail, Ordering::SeqCst); }
    pub fn set_fail_vectors(&self, fail: bool) { self.fail_vectors.store(fail, Ordering::SeqCst); }
    pub fn set_fail_chat_log(&self, fail: bool) { self.fail_chat_log.store(fail, Ordering::SeqCst); }
    pub fn set_fail_analytics(&self, fail: bool) { self.fail_analytics.store(fail, Ordering::SeqCst); }
}

#[async_trait]
impl HotelStore for MemoryStore {
    async fn active_hotel(&self, id: HotelId) -> Result<Option<HotelProfile>> {
        Ok(self.inner.read().hotels.iter().find(|h| h.id == id && h.is_active).cloned())
    }
}

#[async_trait]
impl FaqStore for MemoryStore {
    async fn active_faqs(&self, hotel_id: HotelId, limit: Option<usize>) -> Result<Vec<FaqEntry>> {
        if self.fail_faqs.load(Ordering::SeqCst) { return Err(Error::Storage("faq table unavailable".into())); }
        let mut faqs: Vec<FaqEntry> = self.inner.read().faqs.iter().filter(|f| f.hotel_id == hotel_id && f.is_active).cloned().collect();
        faqs.sort_by_key(|f| (f.order_index, f.id));
        if let Some(limit) = limit { faqs.truncate(limit); }
        Ok(faqs)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn hotel_chunks(&self, hotel_id: HotelId, embedder_id: &str, max_documents: usize) -> Result<Vec<DocumentChunk>> {
        if self.fail_vectors.load(Ordering::SeqCst) { return Err(Error::Storage("vector store unavailable".into())); }
        Ok(self
            .inner
            .read()
            .documents
            .iter()
            .filter(|d| d.hotel_id == hotel_id && d.embedder_id == embedder_id)
            .take(max_documents)
            .flat_map(|d| d.chunks.iter().cloned())
            .collect())
    }
}

#[async_trait]
impl ChatLogStore for MemoryStore {
    async fn append(&self, record: &ChatLogRecord) -> Result<i64> {
        if self.fail_chat_log.load(Ordering::SeqCst) { return Err(Error::Storage("chat log write rejected".into())); }
        let mut inner = self.inner.write();
        let id = inner.chat_logs.iter().map(|(id, _)| *id).max().unwrap_or(0) + 1;
        inner.chat_logs.push((id, record.clone()));
        Ok(id)
    }

    async fn history(&self, hotel_id: HotelId, session_id: &str, limit: usize) -> Result<Vec<ChatLogEntry>> {
        Ok(self
            .inner
            .read()
            .chat_logs
            .iter()
            .filter(|(_, r)| r.hotel_id == hotel_id && r.session_id == session_id)
            .take(limit)
            .map(|(id, r)| ChatLogEntry {
                id: *id,
                question: r.question.clone(),
                answer: r.answer.clone(),
                confidence: r.confidence,
                was_ai_response: r.was_ai_response,
                escalated: r.escalated,
                created_at: r.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl AnalyticsSink for MemoryStore {
    async fn record(&self, event: AnalyticsEvent) {
        if self.fail_analytics.load(Ordering::SeqCst) {
            tracing::warn!(event_type = %event.event_type, "failed to record analytics event");
            return;
        }
        self.inner.write().analytics.push(event);
    }
}

#[async_trait]
impl DocumentWriter for MemoryStore {
    async fn find_document(&self, hotel_id: HotelId, content_hash: &str, embedder_id: &str) -> Result<Option<DocumentId>> {
        Ok(self
            .inner
            .read()
            .documents
            .iter()
            .find(|d| d.hotel_id == hotel_id && d.content_hash == content_hash && d.embedder_id == embedder_id)
            .map(|d| d.id))
    }

    async fn insert_document(&self, document: NewDocument) -> Result<DocumentId> {
        Ok(self.push_document(document.hotel_id, document.content_hash, document.embedder_id, document.chunks))
    }
}
