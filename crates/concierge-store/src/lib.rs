//! Storage backends for the concierge: a SQLite store for production use and
//! an in-memory store for tests, plus the document ingestion writer.

use async_trait::async_trait;

use concierge_core::error::{Error, Result};
use concierge_core::types::{DocumentId, HotelId};

pub mod memory;
pub mod schema;
pub mod seed;
pub mod sqlite;
pub mod table;
pub mod writer;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use writer::{DocumentIndexer, IndexOutcome};

/// A document ready to be persisted: chunk texts with their embeddings.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub hotel_id: HotelId,
    pub name: String,
    pub content_hash: String,
    pub embedder_id: String,
    pub chunks: Vec<(String, Vec<f32>)>,
}

/// Write side of the vector store, used by ingestion only.
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Id of an already stored document with identical content and embedder.
    async fn find_document(&self, hotel_id: HotelId, content_hash: &str, embedder_id: &str) -> Result<Option<DocumentId>>;
    async fn insert_document(&self, document: NewDocument) -> Result<DocumentId>;
}

pub(crate) trait StorageResultExt<T> {
    fn storage(self) -> Result<T>;
}

impl<T> StorageResultExt<T> for rusqlite::Result<T> {
    fn storage(self) -> Result<T> { self.map_err(|e| Error::Storage(e.to_string())) }
}
