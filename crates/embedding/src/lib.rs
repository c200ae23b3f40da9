//! Embedding backends for coursefinder.
//!
//! Two interchangeable variants sit behind [`EmbeddingProvider`]:
//! - [`OpenAiProvider`]: remote OpenAI-compatible embeddings API
//! - [`LocalProvider`]: in-process sentence-embedding model
//!
//! The variant is chosen once from configuration. Both construct their
//! underlying client or model on first use and reuse it afterwards.

mod local;
mod openai;

use std::sync::Arc;

use finder_core::config::{EmbeddingConfig, EmbeddingProvider as ConfigEmbeddingProvider};
use tracing::info;

pub use local::LocalProvider;
pub use openai::OpenAiProvider;

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
  fn name(&self) -> &str;
  fn model_id(&self) -> &str;
  fn dimensions(&self) -> usize;

  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

  /// One vector per input text, in input order. Empty input returns an empty
  /// result without touching the backend.
  async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

impl dyn EmbeddingProvider {
  pub fn from_config(config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
      ConfigEmbeddingProvider::Local => Arc::new(LocalProvider::new(config)),
      ConfigEmbeddingProvider::OpenAi => Arc::new(OpenAiProvider::new(config)),
    };

    info!(
      provider = provider.name(),
      model = provider.model_id(),
      dimensions = provider.dimensions(),
      "Embedding provider selected"
    );
    provider
  }
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
  #[error("No api key configured for provider (set embedding.api_key or OPENAI_API_KEY)")]
  NoApiKey,
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Provider error: {0}")]
  ProviderError(String),
  #[error("Network error: {0}")]
  Network(String),
  #[error("Request timed out")]
  Timeout,
  #[error("Local embedding model unavailable: {0}")]
  ModelUnavailable(String),
  #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
  DimensionMismatch { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
  use super::*;
  use finder_core::config::EmbeddingProvider as Kind;

  #[test]
  fn test_from_config_selects_variant() {
    let local = <dyn EmbeddingProvider>::from_config(&EmbeddingConfig::for_provider(Kind::Local));
    assert_eq!(local.name(), "local");
    assert_eq!(local.model_id(), "all-MiniLM-L6-v2");
    assert_eq!(local.dimensions(), 384);

    let remote = <dyn EmbeddingProvider>::from_config(&EmbeddingConfig::for_provider(Kind::OpenAi));
    assert_eq!(remote.name(), "openai");
    assert_eq!(remote.model_id(), "text-embedding-3-small");
    assert_eq!(remote.dimensions(), 1536);
  }

  #[test]
  fn test_dimension_mismatch_message() {
    let err = EmbeddingError::DimensionMismatch { expected: 384, got: 1536 };
    assert_eq!(err.to_string(), "Embedding dimension mismatch: expected 384, got 1536");
  }
}
