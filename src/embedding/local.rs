//! Local ONNX Runtime embedding provider.
//!
//! Implements [`EmbeddingProvider`] with the multilingual sentence
//! transformer paraphrase-multilingual-MiniLM-L12-v2 via `ort`. Handles
//! input truncation, tokenization, batched inference, attention-masked
//! mean pooling, and L2 normalization. The knowledge corpus is expected to
//! be multilingual, hence the model choice.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{truncate_input, EmbeddingProvider, EMBEDDING_DIM, MAX_BATCH_SIZE};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for paraphrase-multilingual-MiniLM-L12-v2.
const MAX_SEQ_LEN: usize = 128;

/// Local ONNX-based embedding provider.
pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex.
// The Mutex guarantees exclusive access during run().
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let model_path = cache_dir.join("model.onnx");
        let tokenizer_path = cache_dir.join("tokenizer.json");

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `memory-forge model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `memory-forge model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        tracing::info!(model = %model_path.display(), "embedding model loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model_id: config.model.clone(),
        })
    }

    /// Run one inference pass over at most [`MAX_BATCH_SIZE`] texts.
    fn run_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings[0].get_ids().len();

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }
        let mask_flat = attention_mask.clone();

        let shape = vec![batch_size as i64, seq_len as i64];
        let input_ids_tensor = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))?;
        let attention_mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask.into_boxed_slice()))?;
        // token_type_ids: all zeros (single sentence, no segment B)
        let token_type_ids = vec![0i64; batch_size * seq_len];
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        })?;

        // Token embeddings — shape [batch, seq, dim]. The output name varies
        // by ONNX export; try common names, fall back to index 0.
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (out_shape, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings tensor")?;

        let dims: &[i64] = &out_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embeddings shape: {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );
        let hidden_dim = dims[2] as usize;
        let actual_seq_len = dims[1] as usize;

        // Attention-masked mean pooling, then L2 normalization
        let mut results = Vec::with_capacity(batch_size);
        for b in 0..batch_size {
            let mut sum = vec![0.0f32; hidden_dim];
            let mut count = 0.0f32;
            for s in 0..actual_seq_len {
                let mask = mask_flat[b * seq_len + s] as f32;
                if mask > 0.0 {
                    let offset = (b * actual_seq_len + s) * hidden_dim;
                    for d in 0..hidden_dim {
                        sum[d] += data[offset + d] * mask;
                    }
                    count += mask;
                }
            }
            if count > 0.0 {
                for v in &mut sum {
                    *v /= count;
                }
            }
            results.push(l2_normalize(&sum));
        }

        Ok(results)
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text])?;
        Ok(results.into_iter().next().expect("batch had one input"))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // Truncate oversized inputs (deliberately lossy), then run the
        // inference in bounded sub-batches.
        let truncated: Vec<&str> = texts.iter().map(|t| truncate_input(t)).collect();

        let mut results = Vec::with_capacity(truncated.len());
        for batch in truncated.chunks(MAX_BATCH_SIZE) {
            results.extend(self.run_batch(batch)?);
        }
        Ok(results)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
