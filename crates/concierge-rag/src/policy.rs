//! Confidence scoring and the escalation decision for model answers.

use concierge_core::types::{AnswerPayload, FinishReason};

use crate::generate::GeneratedAnswer;

pub const ESCALATION_KEYWORDS: [&str; 3] = ["complaint", "problem", "issue"];
pub const ESCALATION_THRESHOLD: f32 = 0.7;

const MIN_CONFIDENCE: f32 = 0.5;
const MAX_CONFIDENCE: f32 = 0.95;

/// Coarse heuristic: a model that stopped on its own is trusted more than one
/// that was cut off or filtered.
pub fn confidence_for(reason: &FinishReason) -> f32 {
    let raw = if *reason == FinishReason::Stop { 0.9 } else { 0.7 };
    f32::clamp(raw, MIN_CONFIDENCE, MAX_CONFIDENCE)
}

pub fn should_escalate(confidence: f32, question: &str) -> bool {
    let question = question.to_lowercase();
    confidence < ESCALATION_THRESHOLD || ESCALATION_KEYWORDS.iter().any(|k| question.contains(k))
}

pub fn escalation_notice(phone: Option<&str>) -> String {
    format!("\n\nIf you need further assistance, please contact our front desk at {}.", phone.unwrap_or("the reception"))
}

/// Turns a generated answer into the guest payload.
pub fn evaluate(generated: GeneratedAnswer, question: &str, phone: Option<&str>) -> AnswerPayload {
    let confidence = confidence_for(&generated.finish_reason);
    let escalated = should_escalate(confidence, question);
    let mut answer = generated.text;
    if escalated {
        answer.push_str(&escalation_notice(phone));
    }
    AnswerPayload { answer, confidence, was_ai_response: true, escalated }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(reason: FinishReason) -> GeneratedAnswer { GeneratedAnswer { text: "Breakfast is 7-10.".into(), finish_reason: reason } }

    #[test]
    fn confidence_depends_on_finish_reason() {
        assert_eq!(confidence_for(&FinishReason::Stop), 0.9);
        assert_eq!(confidence_for(&FinishReason::Length), 0.7);
        assert_eq!(confidence_for(&FinishReason::Other("unknown".into())), 0.7);
    }

    #[test]
    fn threshold_is_strict() {
        assert!(should_escalate(0.69, "When is breakfast?"));
        assert!(!should_escalate(0.70, "When is breakfast?"));
    }

    #[test]
    fn keywords_escalate_regardless_of_confidence() {
        assert!(should_escalate(0.95, "I have a PROBLEM with my room"));
        assert!(should_escalate(0.9, "Who handles a complaint?"));
        assert!(should_escalate(0.9, "there is an issue with the shower"));
    }

    #[test]
    fn clean_stop_is_not_escalated() {
        let payload = evaluate(generated(FinishReason::Stop), "When is breakfast?", Some("+1 555 0100"));
        assert_eq!(payload, AnswerPayload { answer: "Breakfast is 7-10.".into(), confidence: 0.9, was_ai_response: true, escalated: false });
    }

    #[test]
    fn escalation_appends_contact_and_keeps_confidence() {
        let payload = evaluate(generated(FinishReason::Stop), "My AC has a problem", Some("+1 555 0100"));
        assert!(payload.escalated);
        assert_eq!(payload.confidence, 0.9);
        assert_eq!(
            payload.answer,
            "Breakfast is 7-10.\n\nIf you need further assistance, please contact our front desk at +1 555 0100."
        );

        let no_phone = evaluate(generated(FinishReason::Length), "When is breakfast?", None);
        assert!(!no_phone.escalated);
        let no_phone = evaluate(generated(FinishReason::Stop), "issue", None);
        assert!(no_phone.answer.ends_with("contact our front desk at the reception."));
    }
}
