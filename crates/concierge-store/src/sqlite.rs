use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

use concierge_core::error::{Error, Result};
use concierge_core::traits::{AnalyticsSink, ChatLogStore, FaqStore, HotelStore, VectorStore};
use concierge_core::types::{
    AnalyticsEvent, ChatLogEntry, ChatLogRecord, ChatSummary, DailyCount, DocumentChunk, DocumentId, FaqEntry, HotelId,
    HotelProfile, QuestionCount, ReportRange,
};

use crate::{table, DocumentWriter, NewDocument, StorageResultExt};

const HOTEL_COLUMNS: &str = "id, name, slug, description, address, phone, email, wifi_ssid, check_in_time, \
     check_out_time, breakfast_time_start, breakfast_time_end, emergency_contact, is_active";

/// SQLite-backed implementation of every storage interface.
///
/// One connection is shared behind a mutex; queries run on tokio's blocking
/// pool so async callers never block a worker thread.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = table::open_db(path).storage()?;
        tracing::info!(path = %path.display(), "opened sqlite store");
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = table::open_in_memory().storage()?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| Error::Operation(format!("storage task failed: {e}")))?
    }

    /// Inserts a hotel; the profile's `id` is ignored and the new id returned.
    pub async fn insert_hotel(&self, hotel: &HotelProfile) -> Result<HotelId> {
        let h = hotel.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO hotels (name, slug, description, address, phone, email, wifi_ssid, check_in_time, \
                 check_out_time, breakfast_time_start, breakfast_time_end, emergency_contact, is_active) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    h.name, h.slug, h.description, h.address, h.phone, h.email, h.wifi_ssid, h.check_in_time,
                    h.check_out_time, h.breakfast_start, h.breakfast_end, h.emergency_contact, h.is_active
                ],
            )
            .storage()?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn hotel_id_by_slug(&self, slug: &str) -> Result<Option<HotelId>> {
        let slug = slug.to_string();
        self.run(move |conn| {
            conn.query_row("SELECT id FROM hotels WHERE slug = ?1", params![slug], |row| row.get(0)).optional().storage()
        })
        .await
    }

    /// Inserts an FAQ for `faq.hotel_id`; the entry's `id` is ignored.
    pub async fn insert_faq(&self, faq: &FaqEntry) -> Result<i64> {
        let f = faq.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO faqs (hotel_id, question, answer, category, order_index, is_active) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![f.hotel_id, f.question, f.answer, f.category, f.order_index, f.is_active],
            )
            .storage()?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn count_rows(&self, table_name: &'static str) -> Result<i64> {
        self.run(move |conn| table::count_rows(conn, table_name).storage()).await
    }

    /// Dashboard statistics over the hotel's chat log, optionally limited to
    /// exchanges logged inside `range`.
    pub async fn chat_summary(&self, hotel_id: HotelId, range: Option<ReportRange>) -> Result<ChatSummary> {
        let (start, end) = (range.map(|r| r.start), range.map(|r| r.end));
        self.run(move |conn| {
            // ?2 and ?3 are both NULL when no range was given
            const SCOPE: &str = "hotel_id = ?1 AND (?2 IS NULL OR created_at BETWEEN ?2 AND ?3)";
            let (total, resolved, escalated, average_confidence) = conn
                .query_row(
                    &format!(
                        "SELECT COUNT(*), \
                         COALESCE(SUM(CASE WHEN was_ai_response = 1 AND escalated_to_staff = 0 THEN 1 ELSE 0 END), 0), \
                         COALESCE(SUM(CASE WHEN escalated_to_staff = 1 THEN 1 ELSE 0 END), 0), \
                         AVG(CASE WHEN was_ai_response = 1 THEN ai_confidence END) \
                         FROM chat_logs WHERE {SCOPE}"
                    ),
                    params![hotel_id, start, end],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?, row.get::<_, Option<f64>>(3)?)),
                )
                .storage()?;
            let mut summary = ChatSummary::from_counts(total, resolved, escalated, average_confidence);

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT question, COUNT(*) AS n FROM chat_logs WHERE {SCOPE} \
                     GROUP BY question ORDER BY n DESC, question ASC LIMIT 10"
                ))
                .storage()?;
            summary.top_questions = stmt
                .query_map(params![hotel_id, start, end], |row| Ok(QuestionCount { question: row.get(0)?, count: row.get(1)? }))
                .storage()?
                .collect::<rusqlite::Result<Vec<_>>>()
                .storage()?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT substr(created_at, 1, 10) AS day, COUNT(*) FROM chat_logs WHERE {SCOPE} \
                     GROUP BY day ORDER BY day DESC LIMIT 30"
                ))
                .storage()?;
            summary.daily_activity = stmt
                .query_map(params![hotel_id, start, end], |row| Ok(DailyCount { date: row.get(0)?, count: row.get(1)? }))
                .storage()?
                .collect::<rusqlite::Result<Vec<_>>>()
                .storage()?;

            tracing::debug!(hotel_id, total, resolved, escalated, "chat summary computed");
            Ok(summary)
        })
        .await
    }
}

fn hotel_from_row(row: &Row<'_>) -> rusqlite::Result<HotelProfile> {
    Ok(HotelProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        address: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        wifi_ssid: row.get(7)?,
        check_in_time: row.get(8)?,
        check_out_time: row.get(9)?,
        breakfast_start: row.get(10)?,
        breakfast_end: row.get(11)?,
        emergency_contact: row.get(12)?,
        is_active: row.get(13)?,
    })
}

fn faq_from_row(row: &Row<'_>) -> rusqlite::Result<FaqEntry> {
    Ok(FaqEntry {
        id: row.get(0)?,
        hotel_id: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        category: row.get(4)?,
        order_index: row.get(5)?,
        is_active: row.get(6)?,
    })
}

#[async_trait]
impl HotelStore for SqliteStore {
    async fn active_hotel(&self, id: HotelId) -> Result<Option<HotelProfile>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = ?1 AND is_active = 1"),
                params![id],
                hotel_from_row,
            )
            .optional()
            .storage()
        })
        .await
    }
}

#[async_trait]
impl FaqStore for SqliteStore {
    async fn active_faqs(&self, hotel_id: HotelId, limit: Option<usize>) -> Result<Vec<FaqEntry>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        self.run(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, hotel_id, question, answer, category, order_index, is_active FROM faqs \
                     WHERE hotel_id = ?1 AND is_active = 1 ORDER BY order_index ASC, id ASC LIMIT ?2",
                )
                .storage()?;
            let rows = stmt.query_map(params![hotel_id, limit], faq_from_row).storage()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().storage()
        })
        .await
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn hotel_chunks(&self, hotel_id: HotelId, embedder_id: &str, max_documents: usize) -> Result<Vec<DocumentChunk>> {
        let embedder_id = embedder_id.to_string();
        let max_documents = i64::try_from(max_documents).unwrap_or(i64::MAX);
        self.run(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT c.document_id, c.chunk_index, c.content, c.embedding FROM document_chunks c \
                     WHERE c.document_id IN ( \
                         SELECT id FROM documents WHERE hotel_id = ?1 AND embedder_id = ?2 AND is_active = 1 \
                         ORDER BY id ASC LIMIT ?3) \
                     ORDER BY c.document_id ASC, c.chunk_index ASC",
                )
                .storage()?;
            let rows = stmt
                .query_map(params![hotel_id, embedder_id, max_documents], |row| {
                    Ok((row.get::<_, DocumentId>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?, row.get::<_, String>(3)?))
                })
                .storage()?
                .collect::<rusqlite::Result<Vec<_>>>()
                .storage()?;
            rows.into_iter()
                .map(|(document_id, chunk_index, content, embedding)| -> Result<DocumentChunk> {
                    Ok(DocumentChunk {
                        document_id,
                        chunk_index: usize::try_from(chunk_index).unwrap_or_default(),
                        content,
                        embedding: serde_json::from_str(&embedding)?,
                    })
                })
                .collect()
        })
        .await
    }
}

#[async_trait]
impl ChatLogStore for SqliteStore {
    async fn append(&self, record: &ChatLogRecord) -> Result<i64> {
        let r = record.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO chat_logs (hotel_id, session_id, question, answer, ai_confidence, was_ai_response, \
                 escalated_to_staff, language, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    r.hotel_id,
                    r.session_id,
                    r.question,
                    r.answer,
                    f64::from(r.confidence),
                    r.was_ai_response,
                    r.escalated,
                    r.language,
                    r.created_at
                ],
            )
            .storage()?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn history(&self, hotel_id: HotelId, session_id: &str, limit: usize) -> Result<Vec<ChatLogEntry>> {
        let session_id = session_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, question, answer, ai_confidence, was_ai_response, escalated_to_staff, created_at \
                     FROM chat_logs WHERE session_id = ?1 AND hotel_id = ?2 ORDER BY created_at ASC, id ASC LIMIT ?3",
                )
                .storage()?;
            let rows = stmt
                .query_map(params![session_id, hotel_id, limit], |row| {
                    Ok(ChatLogEntry {
                        id: row.get(0)?,
                        question: row.get(1)?,
                        answer: row.get(2)?,
                        confidence: row.get::<_, f64>(3)? as f32,
                        was_ai_response: row.get(4)?,
                        escalated: row.get(5)?,
                        created_at: row.get::<_, DateTime<Utc>>(6)?,
                    })
                })
                .storage()?;
            rows.collect::<rusqlite::Result<Vec<_>>>().storage()
        })
        .await
    }
}

#[async_trait]
impl AnalyticsSink for SqliteStore {
    async fn record(&self, event: AnalyticsEvent) {
        let event_type = event.event_type.clone();
        let result = self
            .run(move |conn| {
                let data = serde_json::to_string(&event.data)?;
                conn.execute(
                    "INSERT INTO analytics_events (hotel_id, event_type, session_id, event_data, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![event.hotel_id, event.event_type, event.session_id, data, event.created_at],
                )
                .storage()?;
                Ok(())
            })
            .await;
        if let Err(e) = result {
            tracing::warn!(event_type = %event_type, error = %e, "failed to record analytics event");
        }
    }
}

#[async_trait]
impl DocumentWriter for SqliteStore {
    async fn find_document(&self, hotel_id: HotelId, content_hash: &str, embedder_id: &str) -> Result<Option<DocumentId>> {
        let (content_hash, embedder_id) = (content_hash.to_string(), embedder_id.to_string());
        self.run(move |conn| {
            conn.query_row(
                "SELECT id FROM documents WHERE hotel_id = ?1 AND content_hash = ?2 AND embedder_id = ?3",
                params![hotel_id, content_hash, embedder_id],
                |row| row.get(0),
            )
            .optional()
            .storage()
        })
        .await
    }

    async fn insert_document(&self, document: NewDocument) -> Result<DocumentId> {
        self.run(move |conn| {
            let tx = conn.transaction().storage()?;
            tx.execute(
                "INSERT INTO documents (hotel_id, name, content_hash, embedder_id, chunk_count, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    document.hotel_id,
                    document.name,
                    document.content_hash,
                    document.embedder_id,
                    i64::try_from(document.chunks.len()).unwrap_or(i64::MAX),
                    Utc::now()
                ],
            )
            .storage()?;
            let document_id = tx.last_insert_rowid();
            {
                let mut stmt = tx
                    .prepare("INSERT INTO document_chunks (document_id, chunk_index, content, embedding) VALUES (?1, ?2, ?3, ?4)")
                    .storage()?;
                for (index, (content, embedding)) in document.chunks.iter().enumerate() {
                    let embedding = serde_json::to_string(embedding)?;
                    let index = i64::try_from(index).unwrap_or(i64::MAX);
                    stmt.execute(params![document_id, index, content, embedding]).storage()?;
                }
            }
            tx.commit().storage()?;
            Ok(document_id)
        })
        .await
    }
}
