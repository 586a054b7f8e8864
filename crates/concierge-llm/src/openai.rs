use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use concierge_core::config::OpenAiSettings;
use concierge_core::error::{Error, Result};
use concierge_core::traits::AnswerGenerator;
use concierge_core::types::{FinishReason, GenerationRequest, GenerationResult};

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Non-streaming client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiChatClient {
    client: Client,
    url: Url,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [OutboundMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: InboundMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct InboundMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::InvalidConfig("openai.api_key is required for answer generation".into()))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| Error::InvalidConfig(format!("invalid openai api key: {e}")))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| Error::Provider(format!("http client build failed: {e}")))?;
        let url = settings.endpoint(CHAT_COMPLETIONS_PATH)?;
        Ok(Self { client, url, model: settings.chat_model.clone() })
    }

    pub fn model(&self) -> &str { &self.model }
}

#[async_trait]
impl AnswerGenerator for OpenAiChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                OutboundMessage { role: "system", content: &request.system_prompt },
                OutboundMessage { role: "user", content: &request.user_content },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("chat completion request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("chat completion returned {status}: {detail}")));
        }
        let payload: ChatCompletionResponse =
            response.json().await.map_err(|e| Error::Provider(format!("malformed chat completion: {e}")))?;
        let choice = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("chat completion contained no choices".into()))?;
        let finish_reason = FinishReason::from_api(choice.finish_reason.as_deref());
        tracing::debug!(model = %self.model, ?finish_reason, "chat completion received");
        Ok(GenerationResult { text: choice.message.content, finish_reason })
    }
}
