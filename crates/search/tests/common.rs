//! Common test utilities for search integration tests
//!
//! Fake embedding backends are deterministic and count every batch they see,
//! so tests can assert exactly when the corpus is (re)built.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use embedding::{EmbeddingError, EmbeddingProvider};
use finder_core::{CourseRecord, SearchConfig};
use search::{CatalogError, CatalogSource, SearchService, StaticSource};

pub const BAG_DIMENSIONS: usize = 64;

/// Token-count vector: lowercase alphanumeric tokens hashed into buckets.
pub fn bag_of_words(text: &str) -> Vec<f32> {
  let mut vector = vec![0.0; BAG_DIMENSIONS];
  for token in text
    .to_lowercase()
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
  {
    let hash = token
      .bytes()
      .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
    vector[(hash % BAG_DIMENSIONS as u64) as usize] += 1.0;
  }
  vector
}

/// Unit vector in 2D with the given cosine against `[1.0, 0.0]`.
pub fn at_cosine(cos: f32) -> Vec<f32> {
  vec![cos, (1.0 - cos * cos).max(0.0).sqrt()]
}

enum Mode {
  BagOfWords,
  Fixed {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
  },
}

pub struct FakeProvider {
  mode: Mode,
  delay: Option<Duration>,
  batch_sizes: Mutex<Vec<usize>>,
  calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeProvider {
  pub fn bag_of_words() -> Self {
    Self::with_mode(Mode::BagOfWords)
  }

  /// Known texts get their vector, everything else gets `fallback`.
  pub fn fixed<I, S>(vectors: I, fallback: Vec<f32>) -> Self
  where
    I: IntoIterator<Item = (S, Vec<f32>)>,
    S: Into<String>,
  {
    Self::with_mode(Mode::Fixed {
      vectors: vectors.into_iter().map(|(k, v)| (k.into(), v)).collect(),
      fallback,
    })
  }

  fn with_mode(mode: Mode) -> Self {
    Self {
      mode,
      delay: None,
      batch_sizes: Mutex::new(Vec::new()),
      calls: AtomicUsize::new(0),
    }
  }

  /// Sleep inside every batch, to widen race windows.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn batch_sizes(&self) -> Vec<usize> {
    self.batch_sizes.lock().unwrap().clone()
  }

  fn vector_for(&self, text: &str) -> Vec<f32> {
    match &self.mode {
      Mode::BagOfWords => bag_of_words(text),
      Mode::Fixed { vectors, fallback } => vectors.get(text).cloned().unwrap_or_else(|| fallback.clone()),
    }
  }
}

#[async_trait]
impl EmbeddingProvider for FakeProvider {
  fn name(&self) -> &str {
    "fake"
  }

  fn model_id(&self) -> &str {
    "fake-model"
  }

  fn dimensions(&self) -> usize {
    match &self.mode {
      Mode::BagOfWords => BAG_DIMENSIONS,
      Mode::Fixed { fallback, .. } => fallback.len(),
    }
  }

  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let mut vectors = self.embed_batch(&[text]).await?;
    vectors
      .pop()
      .ok_or_else(|| EmbeddingError::ProviderError("No embedding returned".into()))
  }

  async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.batch_sizes.lock().unwrap().push(texts.len());
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    Ok(texts.iter().map(|t| self.vector_for(t)).collect())
  }
}

/// Backend that always fails like an unreachable remote API.
#[derive(Default)]
pub struct FailingProvider {
  pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FailingProvider {
  fn name(&self) -> &str {
    "failing"
  }

  fn model_id(&self) -> &str {
    "failing-model"
  }

  fn dimensions(&self) -> usize {
    8
  }

  async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Err(EmbeddingError::Network("connection refused".into()))
  }

  async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Err(EmbeddingError::Network("connection refused".into()))
  }
}

/// Catalog whose contents can be replaced between loads.
#[derive(Default)]
pub struct SwappableSource {
  records: Mutex<Vec<CourseRecord>>,
  pub loads: AtomicUsize,
}

#[allow(dead_code)]
impl SwappableSource {
  pub fn new(records: Vec<CourseRecord>) -> Self {
    Self {
      records: Mutex::new(records),
      loads: AtomicUsize::new(0),
    }
  }

  pub fn replace(&self, records: Vec<CourseRecord>) {
    *self.records.lock().unwrap() = records;
  }
}

#[async_trait]
impl CatalogSource for SwappableSource {
  fn describe(&self) -> String {
    "swappable".to_string()
  }

  async fn load(&self) -> Result<Vec<CourseRecord>, CatalogError> {
    self.loads.fetch_add(1, Ordering::SeqCst);
    Ok(self.records.lock().unwrap().clone())
  }
}

/// Service over fixed records with default thresholds.
#[allow(dead_code)]
pub fn service_with(records: Vec<CourseRecord>, provider: Arc<dyn EmbeddingProvider>) -> SearchService {
  SearchService::new(Arc::new(StaticSource::new(records)), provider, SearchConfig::default())
}
