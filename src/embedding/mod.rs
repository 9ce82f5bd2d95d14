pub mod local;

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::FatalError;

/// Number of dimensions in the embedding vectors
/// (paraphrase-multilingual-MiniLM-L12-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Longest input the embedder accepts. Longer texts are truncated, not
/// rejected; the chunker keeps chunks well under this cap so the loss is
/// confined to pathological inputs.
pub const MAX_INPUT_CHARS: usize = 2000;

/// Upper bound on texts per inference batch.
pub const MAX_BATCH_SIZE: usize = 32;

const LOAD_ATTEMPTS: u32 = 3;
const LOAD_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly
/// [`EMBEDDING_DIM`] dimensions. All methods are synchronous — callers in
/// async contexts should use `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a unit vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings; result order matches input order.
    /// Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Opaque model identifier, compared by equality. Persisted in the
    /// index so a model swap forces a full reindex.
    fn model_id(&self) -> &str;

    /// Number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Truncate an input text to [`MAX_INPUT_CHARS`], respecting char boundaries.
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Create an embedding provider from config.
///
/// Currently only `"local"` is supported (ONNX Runtime +
/// paraphrase-multilingual-MiniLM-L12-v2). Returns an error if model files
/// are not found — run `memory-forge model download` first.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local"),
    }
}

/// Lazy, at-most-once model loader with bounded retries.
///
/// The model is the process singleton; the first caller pays the load cost
/// (with up to [`LOAD_ATTEMPTS`] attempts, [`LOAD_RETRY_DELAY`] apart) and
/// every later caller gets the cached provider. A load that fails all
/// attempts surfaces as a [`FatalError`] so the CLI exits non-zero.
pub struct LazyEmbedder {
    config: EmbeddingConfig,
    inner: Mutex<Option<Arc<dyn EmbeddingProvider>>>,
}

impl LazyEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(None),
        }
    }

    /// Get the provider, loading the model on first use.
    pub fn get(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("embedder lock poisoned: {e}"))?;

        if let Some(provider) = slot.as_ref() {
            return Ok(Arc::clone(provider));
        }

        let mut last_error = None;
        for attempt in 1..=LOAD_ATTEMPTS {
            match create_provider(&self.config) {
                Ok(provider) => {
                    let provider: Arc<dyn EmbeddingProvider> = Arc::from(provider);
                    *slot = Some(Arc::clone(&provider));
                    return Ok(provider);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %format!("{e:#}"), "embedding model load failed");
                    last_error = Some(e);
                    if attempt < LOAD_ATTEMPTS {
                        std::thread::sleep(LOAD_RETRY_DELAY);
                    }
                }
            }
        }

        let cause = last_error.map(|e| format!("{e:#}")).unwrap_or_default();
        Err(anyhow::Error::new(FatalError(format!(
            "embedding model failed to load after {LOAD_ATTEMPTS} attempts: {cause}"
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_input_is_identity() {
        assert_eq!(truncate_input("hello"), "hello");
    }

    #[test]
    fn truncate_long_input_caps_at_limit() {
        let long = "a".repeat(MAX_INPUT_CHARS + 100);
        assert_eq!(truncate_input(&long).chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_INPUT_CHARS + 10);
        let truncated = truncate_input(&long);
        assert_eq!(truncated.chars().count(), MAX_INPUT_CHARS);
        // Must still be valid UTF-8 (would have panicked on a bad slice)
        assert!(truncated.ends_with('é'));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = EmbeddingConfig {
            provider: "remote".into(),
            ..EmbeddingConfig::default()
        };
        let err = create_provider(&config).unwrap_err();
        assert!(err.to_string().contains("unknown embedding provider"));
    }
}
