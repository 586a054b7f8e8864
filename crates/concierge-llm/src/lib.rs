//! Answer generation backed by an OpenAI-compatible chat completions API.

pub mod openai;
pub mod prompt;

pub use openai::OpenAiChatClient;
