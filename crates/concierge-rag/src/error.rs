use std::fmt;
use std::time::Duration;
use thiserror::Error;

use concierge_core::error::Error as CoreError;
use concierge_core::types::HotelId;

/// Errors returned to the caller of the chat boundary. None of them produce a
/// chat-log record except `ChatLog`, which is the failure to write one.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Hotel ID and question are required")]
    MissingInput,

    #[error("Hotel ID is required")]
    MissingHotelId,

    #[error("Hotel not found")]
    HotelNotFound { hotel_id: HotelId },

    #[error("failed to load hotel: {0}")]
    Storage(#[source] CoreError),

    #[error("failed to record chat log: {0}")]
    ChatLog(#[source] CoreError),
}

impl ChatError {
    /// HTTP status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::MissingInput | ChatError::MissingHotelId => 400,
            ChatError::HotelNotFound { .. } => 404,
            ChatError::Storage(_) | ChatError::ChatLog(_) => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Storage,
    Generation,
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Storage => "storage",
            FailureKind::Generation => "generation",
            FailureKind::Timeout => "timeout",
        })
    }
}

/// Why the primary answer pipeline gave up. Internal only; guests get the
/// fallback answer instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure: {message}")]
pub struct PipelineFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl PipelineFailure {
    pub fn storage(err: impl fmt::Display) -> Self { Self { kind: FailureKind::Storage, message: err.to_string() } }

    pub fn generation(err: impl fmt::Display) -> Self { Self { kind: FailureKind::Generation, message: err.to_string() } }

    pub fn timeout(stage: &str, limit: Duration) -> Self {
        Self { kind: FailureKind::Timeout, message: format!("{stage} exceeded {}ms", limit.as_millis()) }
    }
}
