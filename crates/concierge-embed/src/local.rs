//! Offline BGE-M3 embeddings computed with candle.
//!
//! The model directory must contain `tokenizer.json`, `config.json` and
//! `pytorch_model.bin`. Inference runs on a blocking thread so async callers
//! are not stalled.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use concierge_core::error::Error;
use concierge_core::traits::EmbeddingProvider;

use crate::encode::{inference_device, TextEncoder};
use crate::pool::chunk_vector;

pub const LOCAL_DIM: usize = 1024;
const MAX_LEN: usize = 256;

struct EmbeddingModel { model: XLMRobertaModel, encoder: TextEncoder }

impl EmbeddingModel {
    fn load(model_dir: &Path) -> Result<Self> {
        let device = inference_device();
        tracing::info!(dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!("BGE-M3 model loaded");
        Ok(Self { model, encoder: TextEncoder::new(tokenizer, device, MAX_LEN) })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let inputs = self.encoder.encode(text)?;
        let hidden = self.model.forward(&inputs.input_ids, &inputs.attention_mask, &inputs.token_type_ids, None, None, None)?;
        let emb = chunk_vector(&hidden, &inputs.attention_mask, LOCAL_DIM)?;
        if start.elapsed().as_millis() > 100 { tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

pub struct LocalEmbedder { model: Arc<EmbeddingModel>, id: String }

impl LocalEmbedder {
    pub fn new(model_dir: Option<&str>) -> Result<Self> {
        let dir = resolve_model_dir(model_dir)?;
        let model = EmbeddingModel::load(&dir)?;
        Ok(Self { model: Arc::new(model), id: format!("local:bge-m3:d{LOCAL_DIM}") })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { LOCAL_DIM }

    async fn embed(&self, text: &str) -> concierge_core::error::Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.embed_text(&text))
            .await
            .map_err(|e| Error::Operation(format!("embedding task failed: {e}")))?
            .map_err(|e| Error::Provider(e.to_string()))
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured { let p = concierge_core::config::expand_path(dir); if p.exists() { return Ok(p); } }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { return Ok(p); } }
    let root = Path::new("models/bge-m3"); if root.exists() { return Ok(root.to_path_buf()); }
    Err(anyhow!("Could not locate BGE-M3 model directory (set embedding.model_dir or APP_MODEL_DIR)"))
}
