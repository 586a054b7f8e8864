//! Domain types shared by the answer pipeline and its storage backends.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type HotelId = i64;
pub type DocumentId = i64;

/// Guest-facing facts about one hotel.
///
/// Optional fields render as `N/A` in the assembled context. `is_active`
/// hotels are the only ones the pipeline answers for.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HotelProfile {
    #[serde(default)]
    pub id: HotelId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub wifi_ssid: Option<String>,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub check_out_time: Option<String>,
    #[serde(default)]
    pub breakfast_start: Option<String>,
    #[serde(default)]
    pub breakfast_end: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl HotelProfile {
    /// Phone number on file, ignoring blank values.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// One question/answer pair curated by hotel staff.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FaqEntry {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub hotel_id: HotelId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

/// A chunk of an ingested document together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    pub document_id: DocumentId,
    pub chunk_index: usize,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A ranked item. `score` is a cosine similarity in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityCandidate<T> {
    pub item: T,
    pub score: f32,
}

/// Why the language model stopped producing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some(other) => FinishReason::Other(other.to_string()),
            None => FinishReason::Other("unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_content: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub text: Option<String>,
    pub finish_reason: FinishReason,
}

/// The answer handed back to the guest and written to the chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub answer: String,
    pub confidence: f32,
    pub was_ai_response: bool,
    pub escalated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogRecord {
    pub hotel_id: HotelId,
    pub session_id: String,
    pub question: String,
    pub answer: String,
    pub confidence: f32,
    pub was_ai_response: bool,
    pub escalated: bool,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// A stored chat log row as returned by history queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub confidence: f32,
    pub was_ai_response: bool,
    pub escalated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub hotel_id: HotelId,
    pub event_type: String,
    pub session_id: Option<String>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub const CHAT_MESSAGE: &'static str = "chat_message";

    pub fn chat_message(record: &ChatLogRecord) -> Self {
        Self {
            hotel_id: record.hotel_id,
            event_type: Self::CHAT_MESSAGE.to_string(),
            session_id: Some(record.session_id.clone()),
            data: serde_json::json!({
                "session_id": record.session_id,
                "question_length": record.question.chars().count(),
                "ai_confidence": record.confidence,
                "was_ai_response": record.was_ai_response,
                "escalated": record.escalated,
            }),
            created_at: record.created_at,
        }
    }
}

/// Inclusive time window for chat statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportRange {
    /// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates. A bare end
    /// date covers that whole day.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let range = Self { start: parse_bound(start, NaiveTime::MIN)?, end: parse_bound(end, last_instant())? };
        if range.start > range.end {
            return Err(Error::InvalidConfig(format!("report range starts after it ends ({start} > {end})")));
        }
        Ok(range)
    }
}

fn last_instant() -> NaiveTime { NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN) }

fn parse_bound(raw: &str, time_of_day: NaiveTime) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(time_of_day).and_utc())
        .map_err(|_| Error::InvalidConfig(format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got '{raw}'")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCount {
    pub question: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD` in UTC.
    pub date: String,
    pub count: i64,
}

/// Per-hotel chat statistics for the staff dashboard. Rates are percentages
/// of all logged exchanges; `average_confidence` only counts model answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub total_chat_messages: i64,
    pub ai_resolution_rate: f64,
    pub average_confidence: f64,
    pub escalation_rate: f64,
    /// Ten most frequent questions, most asked first.
    pub top_questions: Vec<QuestionCount>,
    /// Message counts for the 30 most recent active days, newest first.
    pub daily_activity: Vec<DailyCount>,
    pub estimated_hours_saved: f64,
}

impl ChatSummary {
    /// Staff time saved per question the model resolved without escalation.
    pub const HOURS_SAVED_PER_RESOLUTION: f64 = 0.1;

    pub fn from_counts(total: i64, resolved: i64, escalated: i64, average_confidence: Option<f64>) -> Self {
        let percent = |part: i64| if total == 0 { 0.0 } else { part as f64 / total as f64 * 100.0 };
        let hours = (resolved as f64 * Self::HOURS_SAVED_PER_RESOLUTION * 10.0).round() / 10.0;
        Self {
            total_chat_messages: total,
            ai_resolution_rate: percent(resolved),
            average_confidence: average_confidence.unwrap_or(0.0),
            escalation_rate: percent(escalated),
            top_questions: Vec::new(),
            daily_activity: Vec::new(),
            estimated_hours_saved: hours,
        }
    }
}
