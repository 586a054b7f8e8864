//! SQLite connection and housekeeping helpers.

use rusqlite::Connection;
use std::path::Path;

use crate::schema::SCHEMA;

pub fn open_db(path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(dir = %parent.display(), error = %e, "could not create database directory");
        }
    }
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    ensure_schema(conn)
}

pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> { conn.execute_batch(SCHEMA) }

/// Number of rows in `table`. Only accepts known table names.
pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    const TABLES: [&str; 6] = ["hotels", "faqs", "documents", "document_chunks", "chat_logs", "analytics_events"];
    if !TABLES.contains(&table) {
        return Err(rusqlite::Error::InvalidParameterName(table.to_string()));
    }
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
}
