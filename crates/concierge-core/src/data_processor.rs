use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// A text document read from disk, ready to be chunked and embedded.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Token budget per chunk, estimated at 4 characters per token.
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self { max_tokens: 8000 } }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    /// Reads every `.txt` file under `data_dir`, sorted by path.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<SourceDocument>> {
        let files = self.list_txt_files(data_dir);
        if files.is_empty() {
            tracing::info!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!("reading file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let content = self.read_file_content(file_path)?;
            documents.push(SourceDocument { name: self.document_name(file_path), path: file_path.clone(), content });
        }
        tracing::info!(files = documents.len(), dir = %data_dir.display(), "read source documents");
        Ok(documents)
    }

    /// Trims and collapses all whitespace runs to a single space.
    pub fn normalize(&self, text: &str) -> String { text.split_whitespace().collect::<Vec<_>>().join(" ") }

    /// Splits normalized text into sentence-aligned chunks that stay under the
    /// token budget. A single sentence longer than the budget becomes its own chunk.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let max_chars = self.chunking_config.max_tokens.saturating_mul(4);
        let mut chunks = Vec::new();
        let mut current = String::new();
        for sentence in split_sentences(text) {
            let estimated = current.len() + sentence.len();
            if estimated > max_chars && !current.is_empty() {
                chunks.push(current.trim().to_string());
                current = sentence.to_string();
            } else {
                if !current.is_empty() { current.push_str(". "); }
                current.push_str(sentence);
            }
        }
        if !current.is_empty() { chunks.push(current.trim().to_string()); }
        chunks.retain(|c| !c.is_empty());
        chunks
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn document_name(&self, file_path: &Path) -> String {
        file_path.file_name().map_or_else(|| file_path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string())
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path(); if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort(); txt_files
    }
}

/// Splits on runs of `.`, `!` or `?` followed by whitespace. The terminators
/// are dropped; the final sentence keeps any trailing punctuation.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') { continue; }
        let mut end_punct = i + c.len_utf8();
        while let Some(&(j, p)) = chars.peek() {
            if matches!(p, '.' | '!' | '?') { end_punct = j + p.len_utf8(); chars.next(); } else { break; }
        }
        let mut next_start = end_punct;
        while let Some(&(j, w)) = chars.peek() {
            if w.is_whitespace() { next_start = j + w.len_utf8(); chars.next(); } else { break; }
        }
        if next_start > end_punct {
            out.push(&text[start..i]);
            start = next_start;
        }
    }
    if start < text.len() { out.push(&text[start..]); }
    out
}
