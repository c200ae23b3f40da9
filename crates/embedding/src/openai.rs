use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use async_trait::async_trait;
use finder_core::config::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, trace, warn};

use crate::{EmbeddingError, EmbeddingProvider};

/// Remote embeddings over an OpenAI-compatible `/embeddings` endpoint.
///
/// Sub-batches are sent one after another; a failed request fails the whole
/// call. The HTTP client is built on first use and shared across clones.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
  client: Arc<OnceCell<reqwest::Client>>,
  api_key: Option<String>,
  api_base: String,
  model: String,
  dimensions: usize,
  /// Maximum texts per request
  max_batch_size: usize,
  request_timeout: Duration,
}

impl OpenAiProvider {
  pub fn new(config: &EmbeddingConfig) -> Self {
    Self {
      client: Arc::new(OnceCell::new()),
      api_key: config.api_key.clone().filter(|key| !key.is_empty()),
      api_base: config.api_base.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      dimensions: config.dimensions,
      max_batch_size: config.max_batch_size.max(1),
      request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
    }
  }

  /// Get the current max batch size
  pub fn max_batch_size(&self) -> usize {
    self.max_batch_size
  }

  fn embeddings_url(&self) -> String {
    format!("{}/embeddings", self.api_base)
  }

  async fn client(&self) -> Result<&reqwest::Client, EmbeddingError> {
    self
      .client
      .get_or_try_init(|| async {
        if self.api_key.is_none() {
          error!(model = %self.model, "OpenAI provider has no api key");
          return Err(EmbeddingError::NoApiKey);
        }
        let client = reqwest::Client::builder().timeout(self.request_timeout).build()?;
        info!(
          model = %self.model,
          dimensions = self.dimensions,
          max_batch_size = self.max_batch_size,
          "OpenAI embedding client ready"
        );
        Ok(client)
      })
      .await
  }

  /// Send one request and return its vectors in input order.
  async fn embed_single_batch(&self, input: EmbeddingInput<'_>, count: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let client = self.client().await?;
    // client() only succeeds with a key present
    let api_key = self.api_key.as_deref().unwrap_or_default();

    let request = EmbeddingRequest {
      model: &self.model,
      input,
    };

    trace!(batch_size = count, model = %self.model, "Sending embedding request");
    let start = Instant::now();

    let response = match client
      .post(self.embeddings_url())
      .bearer_auth(api_key)
      .json(&request)
      .send()
      .await
    {
      Ok(resp) => resp,
      Err(e) => {
        warn!(error = %e, batch_size = count, "Network error sending embedding request");
        if e.is_timeout() {
          return Err(EmbeddingError::Timeout);
        }
        return Err(EmbeddingError::Network(e.to_string()));
      }
    };

    let status = response.status();
    trace!(
      status = %status,
      elapsed_ms = start.elapsed().as_millis(),
      "Received embedding response"
    );

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      if status.as_u16() == 401 || status.as_u16() == 403 {
        error!(status = %status, model = %self.model, "OpenAI authentication failed");
      } else {
        warn!(status = %status, batch_size = count, model = %self.model, "OpenAI embedding request failed");
      }
      return Err(EmbeddingError::ProviderError(format!(
        "OpenAI returned {}: {}",
        status, body
      )));
    }

    let result: EmbeddingResponse = response.json().await?;
    let embeddings = result.into_ordered(count)?;

    for embedding in &embeddings {
      if embedding.len() != self.dimensions {
        warn!(
          expected = self.dimensions,
          got = embedding.len(),
          model = %self.model,
          "Unexpected embedding dimensions"
        );
        break;
      }
    }

    trace!(
      embeddings_count = embeddings.len(),
      elapsed_ms = start.elapsed().as_millis(),
      "Parsed embedding response"
    );
    Ok(embeddings)
  }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  input: EmbeddingInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
  Single(&'a str),
  Batch(&'a [&'a str]),
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
  #[serde(default)]
  index: Option<usize>,
  embedding: Vec<f32>,
}

impl EmbeddingResponse {
  /// Order vectors by their `index` field (falling back to arrival order) and
  /// check that exactly one came back per input.
  fn into_ordered(self, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if self.data.len() != expected {
      error!(expected, got = self.data.len(), "Batch size mismatch in embedding response");
      return Err(EmbeddingError::ProviderError(format!(
        "Batch size mismatch: got {} embeddings for {} inputs",
        self.data.len(),
        expected
      )));
    }

    let mut data: Vec<(usize, Vec<f32>)> = self
      .data
      .into_iter()
      .enumerate()
      .map(|(position, item)| (item.index.unwrap_or(position), item.embedding))
      .collect();
    data.sort_by_key(|(index, _)| *index);

    if data.iter().enumerate().any(|(expected_index, (index, _))| expected_index != *index) {
      return Err(EmbeddingError::ProviderError(
        "Embedding response indices do not cover the request".to_string(),
      ));
    }

    Ok(data.into_iter().map(|(_, embedding)| embedding).collect())
  }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
  fn name(&self) -> &str {
    "openai"
  }

  fn model_id(&self) -> &str {
    &self.model
  }

  fn dimensions(&self) -> usize {
    self.dimensions
  }

  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    self
      .embed_single_batch(EmbeddingInput::Single(text), 1)
      .await?
      .pop()
      .ok_or_else(|| EmbeddingError::ProviderError("No embedding in response".into()))
  }

  async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if texts.is_empty() {
      trace!("Empty batch, returning immediately");
      return Ok(Vec::new());
    }

    let num_batches = texts.len().div_ceil(self.max_batch_size);
    let start = Instant::now();
    debug!(
      batch_size = texts.len(),
      sub_batches = num_batches,
      max_batch_size = self.max_batch_size,
      model = %self.model,
      "Embedding batch with OpenAI"
    );

    let mut all_embeddings = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(self.max_batch_size) {
      let embeddings = self.embed_single_batch(EmbeddingInput::Batch(chunk), chunk.len()).await?;
      all_embeddings.extend(embeddings);
    }

    debug!(
      batch_size = texts.len(),
      sub_batches = num_batches,
      elapsed_ms = start.elapsed().as_millis(),
      "OpenAI batch embedding complete"
    );
    Ok(all_embeddings)
  }
}
