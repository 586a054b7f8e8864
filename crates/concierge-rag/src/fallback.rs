use std::sync::Arc;

use concierge_core::traits::FaqStore;
use concierge_core::types::{AnswerPayload, FaqEntry, HotelProfile};

pub const KEYWORD_CONFIDENCE: f32 = 0.6;
pub const GENERIC_CONFIDENCE: f32 = 0.3;
pub const MIN_KEYWORD_MATCHES: usize = 2;

/// Answers without the language model: first by keyword overlap with stored
/// FAQ questions, then with a generic pointer to the front desk.
pub struct FallbackResponder {
    faqs: Arc<dyn FaqStore>,
}

impl FallbackResponder {
    pub fn new(faqs: Arc<dyn FaqStore>) -> Self { Self { faqs } }

    /// Always produces an answer. A failed FAQ read skips straight to the
    /// generic tier.
    pub async fn respond(&self, hotel: &HotelProfile, question: &str) -> AnswerPayload {
        match self.faqs.active_faqs(hotel.id, None).await {
            Ok(faqs) => {
                if let Some(faq) = keyword_match(question, &faqs) {
                    tracing::info!(hotel_id = hotel.id, faq_id = faq.id, "answered from FAQ keyword match");
                    return AnswerPayload {
                        answer: faq.answer.clone(),
                        confidence: KEYWORD_CONFIDENCE,
                        was_ai_response: false,
                        escalated: false,
                    };
                }
            }
            Err(e) => tracing::warn!(hotel_id = hotel.id, error = %e, "FAQ lookup failed during fallback"),
        }
        tracing::info!(hotel_id = hotel.id, "no FAQ matched, using generic answer");
        generic_answer(hotel.phone())
    }
}

/// First FAQ, in storage order, whose lowercased question contains at least
/// two of the question's whitespace-separated tokens.
pub fn keyword_match<'a>(question: &str, faqs: &'a [FaqEntry]) -> Option<&'a FaqEntry> {
    let question = question.to_lowercase();
    let tokens: Vec<&str> = question.split_whitespace().collect();
    faqs.iter().find(|faq| {
        let candidate = faq.question.to_lowercase();
        tokens.iter().filter(|t| candidate.contains(**t)).count() >= MIN_KEYWORD_MATCHES
    })
}

pub fn generic_answer(phone: Option<&str>) -> AnswerPayload {
    AnswerPayload {
        answer: format!(
            "I apologize, but I couldn't find a specific answer to your question. Please contact {} for assistance.",
            phone.unwrap_or("the front desk")
        ),
        confidence: GENERIC_CONFIDENCE,
        was_ai_response: false,
        escalated: true,
    }
}
