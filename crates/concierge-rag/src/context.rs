//! Builds the textual context handed to the language model: hotel facts,
//! curated FAQs and, when retrieval is configured, the best matching chunks
//! of the hotel's ingested documents.

use std::sync::Arc;
use std::time::{Duration, Instant};

use concierge_core::config::RetrievalSettings;
use concierge_core::error::Result;
use concierge_core::traits::{EmbeddingProvider, FaqStore, VectorStore};
use concierge_core::types::{FaqEntry, HotelId, HotelProfile, SimilarityCandidate};

use crate::error::PipelineFailure;
use crate::ranker;

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub faq_limit: usize,
    pub max_documents: usize,
    pub similarity_threshold: f32,
    pub top_k: usize,
    pub timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { faq_limit: 20, max_documents: 10, similarity_threshold: 0.7, top_k: 3, timeout: Duration::from_secs(5) }
    }
}

impl From<&RetrievalSettings> for RetrievalConfig {
    fn from(s: &RetrievalSettings) -> Self {
        Self {
            faq_limit: s.faq_limit,
            max_documents: s.max_documents,
            similarity_threshold: s.similarity_threshold,
            top_k: s.top_k,
            timeout: Duration::from_millis(s.timeout_ms),
        }
    }
}

/// Embedding provider and vector store pair used for document retrieval.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vectors: Arc<dyn VectorStore>) -> Self { Self { embedder, vectors } }

    /// Chunks of the hotel's documents ranked against the question, thresholded
    /// and capped per `config`.
    pub async fn search(&self, hotel_id: HotelId, question: &str, config: &RetrievalConfig) -> Result<Vec<SimilarityCandidate<String>>> {
        let query = self.embedder.embed(question).await?;
        let chunks = self.vectors.hotel_chunks(hotel_id, self.embedder.id(), config.max_documents).await?;
        let scanned = chunks.len();
        let ranked = ranker::rank(&query, chunks.into_iter().map(|c| (c.content, c.embedding)));
        let hits = ranker::top_k_above(ranked, config.similarity_threshold, config.top_k);
        tracing::debug!(hotel_id, scanned, hits = hits.len(), "ranked document chunks");
        Ok(hits)
    }
}

/// The rendered context together with what went into it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    pub faq_count: usize,
    pub retrieved_chunks: usize,
}

pub struct ContextAssembler {
    faqs: Arc<dyn FaqStore>,
    retriever: Option<Retriever>,
    config: RetrievalConfig,
}

impl ContextAssembler {
    pub fn new(faqs: Arc<dyn FaqStore>, retriever: Option<Retriever>, config: RetrievalConfig) -> Self {
        Self { faqs, retriever, config }
    }

    /// Fails only when the FAQ read fails. Retrieval problems degrade to a
    /// context without document chunks.
    pub async fn assemble(&self, hotel: &HotelProfile, question: &str) -> std::result::Result<AssembledContext, PipelineFailure> {
        let faqs = self.faqs.active_faqs(hotel.id, Some(self.config.faq_limit)).await.map_err(PipelineFailure::storage)?;
        let chunks = self.retrieve(hotel.id, question).await;
        Ok(AssembledContext { text: render_context(hotel, &faqs, &chunks), faq_count: faqs.len(), retrieved_chunks: chunks.len() })
    }

    async fn retrieve(&self, hotel_id: HotelId, question: &str) -> Vec<String> {
        let Some(retriever) = &self.retriever else { return vec![] };
        let started = Instant::now();
        match tokio::time::timeout(self.config.timeout, retriever.search(hotel_id, question, &self.config)).await {
            Ok(Ok(hits)) => {
                tracing::debug!(hotel_id, elapsed_ms = started.elapsed().as_millis() as u64, "retrieval finished");
                hits.into_iter().map(|c| c.item).collect()
            }
            Ok(Err(e)) => {
                tracing::warn!(hotel_id, error = %e, "document retrieval failed, continuing without it");
                vec![]
            }
            Err(_) => {
                tracing::warn!(hotel_id, timeout_ms = self.config.timeout.as_millis() as u64, "document retrieval timed out, continuing without it");
                vec![]
            }
        }
    }
}

fn or_na(value: Option<&String>) -> &str { value.map(String::as_str).filter(|v| !v.trim().is_empty()).unwrap_or("N/A") }

/// Renders the context block. The document section only appears when at
/// least one chunk was retrieved.
pub fn render_context(hotel: &HotelProfile, faqs: &[FaqEntry], chunks: &[String]) -> String {
    let mut out = String::from("Hotel Information:\n");
    let facts = [
        ("Name", Some(&hotel.name)),
        ("Description", hotel.description.as_ref()),
        ("Address", hotel.address.as_ref()),
        ("Phone", hotel.phone.as_ref()),
        ("Email", hotel.email.as_ref()),
        ("WiFi", hotel.wifi_ssid.as_ref()),
        ("Check-in", hotel.check_in_time.as_ref()),
        ("Check-out", hotel.check_out_time.as_ref()),
    ];
    for (label, value) in facts {
        out.push_str(&format!("- {label}: {}\n", or_na(value)));
    }
    out.push_str(&format!(
        "- Breakfast: {} - {}\n",
        or_na(hotel.breakfast_start.as_ref()),
        or_na(hotel.breakfast_end.as_ref())
    ));
    out.push_str(&format!("- Emergency: {}\n", or_na(hotel.emergency_contact.as_ref())));

    out.push_str("\nFrequently Asked Questions:\n");
    let faq_text = faqs.iter().map(|f| format!("Q: {}\nA: {}", f.question, f.answer)).collect::<Vec<_>>().join("\n\n");
    out.push_str(&faq_text);

    if !chunks.is_empty() {
        out.push_str("\n\nAdditional Context from Documents:\n");
        out.push_str(&chunks.join("\n\n"));
    }
    out
}
