use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use concierge_core::data_processor::{DataProcessor, SourceDocument};
use concierge_core::traits::EmbeddingProvider;
use concierge_core::types::{DocumentId, HotelId};

use crate::{DocumentWriter, NewDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed { document_id: DocumentId, chunks: usize },
    /// Same content was already indexed with the same embedder.
    Unchanged { document_id: DocumentId },
}

/// Turns raw document text into stored, embedded chunks for one hotel.
pub struct DocumentIndexer {
    writer: Arc<dyn DocumentWriter>,
    embedder: Arc<dyn EmbeddingProvider>,
    processor: DataProcessor,
}

impl DocumentIndexer {
    pub fn new(writer: Arc<dyn DocumentWriter>, embedder: Arc<dyn EmbeddingProvider>, processor: DataProcessor) -> Self {
        Self { writer, embedder, processor }
    }

    pub async fn index_text(&self, hotel_id: HotelId, name: &str, text: &str) -> Result<IndexOutcome> {
        let normalized = self.processor.normalize(text);
        if normalized.is_empty() {
            bail!("No text content extracted from document");
        }
        let content_hash = blake3::hash(normalized.as_bytes()).to_hex().to_string();
        if let Some(document_id) = self.writer.find_document(hotel_id, &content_hash, self.embedder.id()).await? {
            tracing::info!(hotel_id, document = name, document_id, "document unchanged, skipping");
            return Ok(IndexOutcome::Unchanged { document_id });
        }

        let pieces = self.processor.chunk_text(&normalized);
        let mut chunks = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let embedding = self.embedder.embed(&piece).await?;
            chunks.push((piece, embedding));
        }
        let count = chunks.len();
        let document_id = self
            .writer
            .insert_document(NewDocument {
                hotel_id,
                name: name.to_string(),
                content_hash,
                embedder_id: self.embedder.id().to_string(),
                chunks,
            })
            .await?;
        tracing::info!(hotel_id, document = name, document_id, chunks = count, "indexed document");
        Ok(IndexOutcome::Indexed { document_id, chunks: count })
    }

    pub async fn index_documents(&self, hotel_id: HotelId, documents: &[SourceDocument]) -> Result<Vec<IndexOutcome>> {
        if documents.is_empty() {
            tracing::info!("no documents to index");
            return Ok(vec![]);
        }
        let pb = ProgressBar::new(documents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?
                .progress_chars("#>-"),
        );
        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            pb.set_message(document.name.clone());
            match self.index_text(hotel_id, &document.name, &document.content).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    pb.abandon_with_message(format!("failed on {}", document.name));
                    return Err(e.context(format!("indexing {}", document.path.display())));
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message("done");
        Ok(outcomes)
    }
}
