/// Tables backing the concierge. Embeddings are stored as JSON arrays next to
/// their chunk text; ranking happens in-process over a handful of documents.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hotels (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    description TEXT,
    address TEXT,
    phone TEXT,
    email TEXT,
    wifi_ssid TEXT,
    check_in_time TEXT,
    check_out_time TEXT,
    breakfast_time_start TEXT,
    breakfast_time_end TEXT,
    emergency_contact TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS faqs (
    id INTEGER PRIMARY KEY,
    hotel_id INTEGER NOT NULL REFERENCES hotels(id) ON DELETE CASCADE,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    category TEXT,
    order_index INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_faqs_hotel ON faqs(hotel_id, order_index);

CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY,
    hotel_id INTEGER NOT NULL REFERENCES hotels(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    embedder_id TEXT NOT NULL,
    chunk_count INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    UNIQUE (hotel_id, content_hash, embedder_id)
);

CREATE TABLE IF NOT EXISTS document_chunks (
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding TEXT NOT NULL,
    PRIMARY KEY (document_id, chunk_index)
);

CREATE TABLE IF NOT EXISTS chat_logs (
    id INTEGER PRIMARY KEY,
    hotel_id INTEGER NOT NULL,
    session_id TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    ai_confidence REAL NOT NULL,
    was_ai_response INTEGER NOT NULL,
    escalated_to_staff INTEGER NOT NULL,
    language TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chat_logs_session ON chat_logs(session_id, hotel_id);

CREATE TABLE IF NOT EXISTS analytics_events (
    id INTEGER PRIMARY KEY,
    hotel_id INTEGER NOT NULL,
    event_type TEXT NOT NULL,
    session_id TEXT,
    event_data TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;
