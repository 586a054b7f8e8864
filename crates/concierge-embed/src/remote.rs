use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use concierge_core::config::OpenAiSettings;
use concierge_core::error::{Error, Result};
use concierge_core::traits::EmbeddingProvider;

const EMBEDDINGS_PATH: &str = "embeddings";

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    url: Url,
    model: String,
    dim: usize,
    id: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(settings: &OpenAiSettings, dim: usize) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::InvalidConfig("openai.api_key is required for remote embeddings".into()))?;
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
        let url = settings.endpoint(EMBEDDINGS_PATH)?;
        let model = settings.embedding_model.clone();
        Ok(Self { client, url, id: format!("openai:{model}"), model, dim })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&EmbeddingRequest { model: &self.model, input: text })
            .send()
            .await
            .map_err(|e| Error::Provider(format!("embedding request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("embedding request returned {status}: {body}")));
        }
        let payload: EmbeddingResponse =
            response.json().await.map_err(|e| Error::Provider(format!("malformed embedding response: {e}")))?;
        payload
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Provider("embedding response contained no data".into()))
    }
}
