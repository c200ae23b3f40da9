//! Corpus embedding cache.
//!
//! Each catalog record is rendered to a descriptive text and embedded once.
//! The resulting [`Corpus`] keeps the catalog snapshot it was built from, so a
//! corpus and its catalog are always replaced together.

use std::sync::Arc;
use std::time::Instant;

use embedding::{EmbeddingError, EmbeddingProvider};
use finder_core::{CourseRecord, is_missing};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;

pub const TEXT_SEPARATOR: &str = " | ";

/// Non-missing attribute values in catalog order, joined by [`TEXT_SEPARATOR`].
pub fn descriptive_text(record: &CourseRecord) -> String {
  record
    .values()
    .map(|(_, value)| value.trim())
    .filter(|value| !is_missing(value))
    .collect::<Vec<_>>()
    .join(TEXT_SEPARATOR)
}

/// Embedded catalog: `vectors[i]` belongs to `catalog().courses()[i]`.
#[derive(Debug)]
pub struct Corpus {
  catalog: Arc<Catalog>,
  texts: Vec<String>,
  vectors: Vec<Vec<f32>>,
}

impl Corpus {
  pub fn catalog(&self) -> &Arc<Catalog> {
    &self.catalog
  }

  /// Descriptive text each vector was embedded from.
  pub(crate) fn texts(&self) -> &[String] {
    &self.texts
  }

  pub fn vectors(&self) -> &[Vec<f32>] {
    &self.vectors
  }

  pub fn len(&self) -> usize {
    self.vectors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vectors.is_empty()
  }

  pub fn dimensions(&self) -> usize {
    self.vectors.first().map(Vec::len).unwrap_or(0)
  }

  pub fn is_built_from(&self, catalog: &Arc<Catalog>) -> bool {
    Arc::ptr_eq(&self.catalog, catalog)
  }
}

/// Build-once holder for the corpus embeddings.
///
/// Concurrent callers wait on the same build. A failed build leaves the cache
/// empty so the next caller retries.
#[derive(Debug, Default)]
pub struct CorpusCache {
  slot: Mutex<Option<Arc<Corpus>>>,
}

impl CorpusCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Return the corpus for `catalog`, embedding it on first use.
  ///
  /// `Ok(None)` means the catalog yields no vectors (empty catalog, every
  /// record blank, or the backend returned nothing).
  pub async fn get_or_build(
    &self,
    catalog: &Arc<Catalog>,
    provider: &dyn EmbeddingProvider,
  ) -> Result<Option<Arc<Corpus>>, EmbeddingError> {
    let mut slot = self.slot.lock().await;

    if let Some(corpus) = slot.as_ref() {
      if corpus.is_built_from(catalog) {
        return Ok(Some(corpus.clone()));
      }
      debug!("Catalog snapshot changed, rebuilding corpus embeddings");
      *slot = None;
    }

    let Some(corpus) = build(catalog, provider).await? else {
      return Ok(None);
    };
    let corpus = Arc::new(corpus);
    *slot = Some(corpus.clone());
    Ok(Some(corpus))
  }

  /// Drop the cached corpus; the next search rebuilds it.
  pub async fn invalidate(&self) {
    if self.slot.lock().await.take().is_some() {
      debug!("Corpus embeddings invalidated");
    }
  }

  pub async fn is_built(&self) -> bool {
    self.slot.lock().await.is_some()
  }
}

async fn build(catalog: &Arc<Catalog>, provider: &dyn EmbeddingProvider) -> Result<Option<Corpus>, EmbeddingError> {
  if catalog.is_empty() {
    return Ok(None);
  }

  let texts: Vec<String> = catalog.iter().map(descriptive_text).collect();

  // Blank records are not sent to the backend; they get a zero vector, which
  // scores 0.0 against every query.
  let (positions, inputs): (Vec<usize>, Vec<&str>) = texts
    .iter()
    .enumerate()
    .filter(|(_, text)| !text.is_empty())
    .map(|(i, text)| (i, text.as_str()))
    .unzip();

  if inputs.is_empty() {
    warn!(courses = catalog.len(), "Every catalog record is blank, nothing to embed");
    return Ok(None);
  }

  info!(
    courses = catalog.len(),
    provider = provider.name(),
    model = provider.model_id(),
    "Generating corpus embeddings"
  );
  let start = Instant::now();
  let embedded = provider.embed_batch(&inputs).await?;

  if embedded.is_empty() {
    warn!(provider = provider.name(), "Backend returned no corpus embeddings");
    return Ok(None);
  }
  if embedded.len() != inputs.len() {
    return Err(EmbeddingError::ProviderError(format!(
      "Batch size mismatch: got {} embeddings for {} courses",
      embedded.len(),
      inputs.len()
    )));
  }

  let dimensions = embedded[0].len();
  if dimensions == 0 {
    warn!(provider = provider.name(), "Backend returned empty corpus vectors");
    return Ok(None);
  }
  if let Some(bad) = embedded.iter().find(|v| v.len() != dimensions) {
    return Err(EmbeddingError::DimensionMismatch {
      expected: dimensions,
      got: bad.len(),
    });
  }

  let mut vectors = vec![vec![0.0f32; dimensions]; texts.len()];
  for (position, vector) in positions.into_iter().zip(embedded) {
    vectors[position] = vector;
  }

  info!(
    courses = vectors.len(),
    dimensions,
    elapsed_ms = start.elapsed().as_millis(),
    "Corpus embeddings ready"
  );

  Ok(Some(Corpus {
    catalog: catalog.clone(),
    texts,
    vectors,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use finder_core::CourseField;
  use pretty_assertions::assert_eq;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Embeds text as [length, 1.0] and counts backend calls.
  #[derive(Default)]
  struct LengthProvider {
    calls: AtomicUsize,
    inputs: std::sync::Mutex<Vec<String>>,
  }

  #[async_trait]
  impl EmbeddingProvider for LengthProvider {
    fn name(&self) -> &str {
      "length"
    }
    fn model_id(&self) -> &str {
      "length"
    }
    fn dimensions(&self) -> usize {
      2
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
      Ok(vec![text.len() as f32, 1.0])
    }
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self
        .inputs
        .lock()
        .unwrap()
        .extend(texts.iter().map(|t| t.to_string()));
      Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
  }

  fn catalog(records: Vec<CourseRecord>) -> Arc<Catalog> {
    Arc::new(Catalog::new(records))
  }

  #[test]
  fn test_descriptive_text_skips_missing_values() {
    let record = CourseRecord::named("Intro to Data Science")
      .with(CourseField::Department, "Computer Science")
      .with(CourseField::Skills, "nan")
      .with(CourseField::CourseLevel, "Beginner");
    assert_eq!(
      descriptive_text(&record),
      "Intro to Data Science | Computer Science | Beginner"
    );
    assert_eq!(descriptive_text(&CourseRecord::default()), "");
  }

  #[tokio::test]
  async fn test_build_once_and_reuse() {
    let provider = LengthProvider::default();
    let cache = CorpusCache::new();
    let snapshot = catalog(vec![CourseRecord::named("a"), CourseRecord::named("bbb")]);

    let first = cache.get_or_build(&snapshot, &provider).await.unwrap().expect("corpus");
    let second = cache.get_or_build(&snapshot, &provider).await.unwrap().expect("corpus");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.vectors(), &[vec![1.0, 1.0], vec![3.0, 1.0]]);
    assert_eq!(first.dimensions(), 2);
    assert!(cache.is_built().await);
  }

  #[tokio::test]
  async fn test_new_snapshot_triggers_rebuild() {
    let provider = LengthProvider::default();
    let cache = CorpusCache::new();
    let old = catalog(vec![CourseRecord::named("a")]);
    let new = catalog(vec![CourseRecord::named("a")]);

    cache.get_or_build(&old, &provider).await.unwrap();
    let rebuilt = cache.get_or_build(&new, &provider).await.unwrap().expect("corpus");

    assert!(rebuilt.is_built_from(&new));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_blank_records_get_zero_vectors() {
    let provider = LengthProvider::default();
    let cache = CorpusCache::new();
    let snapshot = catalog(vec![CourseRecord::named("ab"), CourseRecord::default()]);

    let corpus = cache.get_or_build(&snapshot, &provider).await.unwrap().expect("corpus");
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.vectors()[1], vec![0.0, 0.0]);
    assert_eq!(corpus.texts(), &["ab".to_string(), String::new()]);
    assert_eq!(*provider.inputs.lock().unwrap(), vec!["ab".to_string()]);
  }

  #[tokio::test]
  async fn test_empty_or_blank_catalog_yields_nothing() {
    let provider = LengthProvider::default();
    let cache = CorpusCache::new();

    assert!(cache.get_or_build(&catalog(vec![]), &provider).await.unwrap().is_none());
    let blank = catalog(vec![CourseRecord::default(), CourseRecord::named("nan")]);
    assert!(cache.get_or_build(&blank, &provider).await.unwrap().is_none());

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert!(!cache.is_built().await);
  }

  #[tokio::test]
  async fn test_invalidate_clears_cache() {
    let provider = LengthProvider::default();
    let cache = CorpusCache::new();
    let snapshot = catalog(vec![CourseRecord::named("a")]);

    cache.get_or_build(&snapshot, &provider).await.unwrap();
    cache.invalidate().await;
    assert!(!cache.is_built().await);

    cache.get_or_build(&snapshot, &provider).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
  }
}
