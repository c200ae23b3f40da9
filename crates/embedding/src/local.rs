use std::path::PathBuf;

use async_trait::async_trait;
use finder_core::config::EmbeddingConfig;
use tracing::trace;

use crate::{EmbeddingError, EmbeddingProvider};

const UNAVAILABLE_HINT: &str = "set embedding.provider = \"openai\" (or USE_OPENAI_EMBEDDING=true) to use the remote API";

/// In-process sentence-embedding model.
///
/// The model is loaded on first use. Builds without the `local-model` feature
/// still construct this provider, but every non-empty request fails with
/// [`EmbeddingError::ModelUnavailable`].
#[derive(Clone)]
pub struct LocalProvider {
  model: String,
  dimensions: usize,
  cache_dir: Option<PathBuf>,
  #[cfg(feature = "local-model")]
  engine: std::sync::Arc<tokio::sync::OnceCell<std::sync::Arc<fastembed::TextEmbedding>>>,
}

impl LocalProvider {
  pub fn new(config: &EmbeddingConfig) -> Self {
    Self {
      model: config.model.clone(),
      dimensions: config.dimensions,
      cache_dir: config.cache_dir.clone(),
      #[cfg(feature = "local-model")]
      engine: Default::default(),
    }
  }

  pub fn cache_dir(&self) -> Option<&std::path::Path> {
    self.cache_dir.as_deref()
  }
}

impl std::fmt::Debug for LocalProvider {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LocalProvider")
      .field("model", &self.model)
      .field("dimensions", &self.dimensions)
      .field("cache_dir", &self.cache_dir)
      .finish_non_exhaustive()
  }
}

#[cfg(not(feature = "local-model"))]
impl LocalProvider {
  async fn encode(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    tracing::error!(model = %self.model, "Local embedding support is not compiled into this build");
    Err(EmbeddingError::ModelUnavailable(format!(
      "this build has no local model support (enable the `local-model` feature); {}",
      UNAVAILABLE_HINT
    )))
  }
}

#[cfg(feature = "local-model")]
impl LocalProvider {
  fn model_kind(&self) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
    use fastembed::EmbeddingModel;

    let name = self.model.rsplit('/').next().unwrap_or(&self.model).to_lowercase();
    match name.as_str() {
      "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
      "all-minilm-l12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
      "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
      "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
      _ => Err(EmbeddingError::ModelUnavailable(format!(
        "unsupported local model '{}'; {}",
        self.model, UNAVAILABLE_HINT
      ))),
    }
  }

  async fn engine(&self) -> Result<std::sync::Arc<fastembed::TextEmbedding>, EmbeddingError> {
    use fastembed::{InitOptions, TextEmbedding};

    let engine = self
      .engine
      .get_or_try_init(|| async {
        let kind = self.model_kind()?;
        let mut options = InitOptions::new(kind).with_show_download_progress(false);
        if let Some(dir) = &self.cache_dir {
          options = options.with_cache_dir(dir.clone());
        }

        tracing::info!(model = %self.model, "Loading local embedding model");
        let start = std::time::Instant::now();
        let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
          .await
          .map_err(|e| EmbeddingError::ProviderError(format!("model loader panicked: {}", e)))?
          .map_err(|e| {
            tracing::error!(model = %self.model, err = %e, "Failed to load local embedding model");
            EmbeddingError::ModelUnavailable(format!("{}; {}", e, UNAVAILABLE_HINT))
          })?;
        tracing::info!(
          model = %self.model,
          elapsed_ms = start.elapsed().as_millis(),
          "Local embedding model loaded"
        );
        Ok::<_, EmbeddingError>(std::sync::Arc::new(model))
      })
      .await?;
    Ok(engine.clone())
  }

  async fn encode(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let engine = self.engine().await?;
    let count = texts.len();

    let embeddings = tokio::task::spawn_blocking(move || engine.embed(texts, None))
      .await
      .map_err(|e| EmbeddingError::ProviderError(format!("embedding task panicked: {}", e)))?
      .map_err(|e| EmbeddingError::ProviderError(e.to_string()))?;

    if embeddings.len() != count {
      return Err(EmbeddingError::ProviderError(format!(
        "Batch size mismatch: got {} embeddings for {} inputs",
        embeddings.len(),
        count
      )));
    }
    Ok(embeddings)
  }
}

#[async_trait]
impl EmbeddingProvider for LocalProvider {
  fn name(&self) -> &str {
    "local"
  }

  fn model_id(&self) -> &str {
    &self.model
  }

  fn dimensions(&self) -> usize {
    self.dimensions
  }

  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    self
      .encode(vec![text.to_string()])
      .await?
      .pop()
      .ok_or_else(|| EmbeddingError::ProviderError("No embedding returned".into()))
  }

  async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }
    trace!(batch_size = texts.len(), model = %self.model, "Embedding batch locally");
    self.encode(texts.iter().map(|t| t.to_string()).collect()).await
  }
}
