//! Embedding providers: remote OpenAI-compatible API, local BGE-M3 via candle,
//! and a deterministic hashing embedder.

use anyhow::Result;
use std::sync::Arc;

use concierge_core::config::{EmbeddingBackend, Settings};
use concierge_core::traits::EmbeddingProvider;

pub mod encode;
pub mod hashing;
pub mod local;
pub mod pool;
pub mod remote;

pub use hashing::HashingEmbedder;
pub use local::LocalEmbedder;
pub use pool::{chunk_vector, masked_mean_l2};
pub use remote::OpenAiEmbedder;

/// Builds the configured provider. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hashing embedder regardless of configuration.
pub fn get_default_embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    let backend = if use_fake { EmbeddingBackend::Hashing } else { settings.embedding.provider };
    let provider: Arc<dyn EmbeddingProvider> = match backend {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(settings.embedding.dim)),
        EmbeddingBackend::Local => Arc::new(LocalEmbedder::new(settings.embedding.model_dir.as_deref())?),
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbedder::new(&settings.openai, settings.embedding.dim)?),
    };
    tracing::info!(provider = provider.id(), dim = provider.dim(), "embedding provider ready");
    Ok(provider)
}
