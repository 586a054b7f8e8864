//! Input preparation for the local model: device choice and fixed-window
//! token tensors for one document chunk or question.

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-RoBERTa pad token id.
const PAD_ID: u32 = 1;

/// Metal when built with the `metal` feature and a GPU answers, else CPU.
pub fn inference_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            tracing::info!(device = "metal", "local embedder device selected");
            return dev;
        }
    }
    tracing::info!(device = "cpu", "local embedder device selected");
    Device::Cpu
}

/// Model inputs for one text, each shaped `[1, window]`.
pub struct EncodedText {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Tokenizes text into the model's fixed input window on one device.
pub struct TextEncoder {
    tokenizer: Tokenizer,
    device: Device,
    window: usize,
}

impl TextEncoder {
    pub fn new(tokenizer: Tokenizer, device: Device, window: usize) -> Self { Self { tokenizer, device, window } }

    pub fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self.tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {e}"))?;
        let (ids, mask, dropped) = fit_window(encoding.get_ids(), encoding.get_attention_mask(), self.window);
        if dropped > 0 {
            // ingest chunks are budgeted in characters, so long ones lose their tail here
            tracing::debug!(dropped, window = self.window, "text truncated to the model window");
        }
        let shape = (1, self.window);
        Ok(EncodedText {
            input_ids: Tensor::from_iter(ids, &self.device)?.reshape(shape)?,
            attention_mask: Tensor::from_iter(mask, &self.device)?.reshape(shape)?,
            token_type_ids: Tensor::zeros(shape, DType::I64, &self.device)?,
        })
    }
}

/// Truncates or pads ids and mask to exactly `window` entries. Returns the
/// number of tokens cut off.
fn fit_window(ids: &[u32], mask: &[u32], window: usize) -> (Vec<u32>, Vec<u32>, usize) {
    let dropped = ids.len().saturating_sub(window);
    let mut ids = ids[..ids.len().min(window)].to_vec();
    let mut mask = mask[..mask.len().min(window)].to_vec();
    ids.resize(window, PAD_ID);
    mask.resize(window, 0);
    (ids, mask, dropped)
}
