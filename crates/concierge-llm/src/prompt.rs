//! Concierge persona and message layout.

/// Human-readable language name used in the system prompt. Only `en` is
/// expanded; any other code is passed to the model verbatim.
pub fn language_name(code: &str) -> &str {
    if code == "en" { "English" } else { code }
}

pub fn system_prompt(language: &str) -> String {
    format!(
        "You are a helpful, professional hotel concierge assistant. Answer guest questions based on the hotel \
         information provided. Be polite, concise, and accurate. If you're not confident about an answer, suggest \
         contacting hotel staff. Respond in {}.",
        language_name(language)
    )
}

pub fn user_content(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nGuest Question: {question}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_is_spelled_out() {
        assert!(system_prompt("en").ends_with("Respond in English."));
        assert!(system_prompt("de").ends_with("Respond in de."));
    }

    #[test]
    fn user_content_puts_question_last() {
        let content = user_content("Hotel Information:\n- Name: Demo", "Is there parking?");
        assert!(content.starts_with("Context:\nHotel Information:"));
        assert!(content.ends_with("\n\nGuest Question: Is there parking?"));
    }
}
